use std::collections::HashSet;

use icgs_decimal::Decimal;
use icgs_taxonomy::Endpoint;

use crate::dag::Dag;
use crate::error::GraphError;

/// Hard caps on reverse path enumeration. Exceeding either is a rejection,
/// never a silent truncation.
#[derive(Debug, Clone, Copy)]
pub struct EnumerationBudget {
    pub max_paths_per_transaction: usize,
    pub max_path_length: usize,
}

impl Default for EnumerationBudget {
    fn default() -> Self {
        EnumerationBudget {
            max_paths_per_transaction: 10_000,
            max_path_length: 100,
        }
    }
}

/// A simple walk from the candidate edge's target back to a source-only
/// account, paired with its exact-decimal weight.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumeratedPath {
    pub endpoints: Vec<Endpoint>,
    pub weight: Decimal,
}

/// Enumerates every simple path ending at `target`'s sink side that begins
/// with the candidate edge `source -> target` and continues backward
/// through the committed DAG from `source`.
///
/// The candidate edge is always the path's first traversed hop and
/// contributes `amount` to the weight; every subsequent committed edge
/// contributes its own stored amount, so the weight is the product of every
/// edge amount encountered along the walk. A source-only account (no
/// committed edges crediting it) ends a path. Cycle detection is a defensive
/// visited-set check: the DAG is an invariant-enforced acyclic graph, but
/// enumeration does not trust that invariant blindly.
pub fn enumerate_reverse_paths(
    dag: &Dag,
    source: &str,
    target: &str,
    amount: &Decimal,
    budget: EnumerationBudget,
) -> Result<Vec<EnumeratedPath>, GraphError> {
    let mut results = Vec::new();
    let mut path = vec![Endpoint::sink(target), Endpoint::source(source)];
    let mut visited: HashSet<String> = HashSet::from([target.to_string(), source.to_string()]);

    walk(
        dag,
        source,
        amount.clone(),
        &mut path,
        &mut visited,
        &mut results,
        budget,
    )?;

    Ok(results)
}

fn walk(
    dag: &Dag,
    current_account: &str,
    weight_so_far: Decimal,
    path: &mut Vec<Endpoint>,
    visited: &mut HashSet<String>,
    results: &mut Vec<EnumeratedPath>,
    budget: EnumerationBudget,
) -> Result<(), GraphError> {
    if path.len() > budget.max_path_length {
        return Err(GraphError::EnumerationBudgetExceeded {
            limit: budget.max_path_length,
        });
    }

    let mut antecedents = dag.incoming_edges(current_account).peekable();
    if antecedents.peek().is_none() {
        // Source-only vertex: the walk terminates here.
        if results.len() >= budget.max_paths_per_transaction {
            return Err(GraphError::EnumerationBudgetExceeded {
                limit: budget.max_paths_per_transaction,
            });
        }
        results.push(EnumeratedPath {
            endpoints: path.clone(),
            weight: weight_so_far,
        });
        return Ok(());
    }

    let edges: Vec<_> = antecedents.cloned().collect();
    for edge in edges {
        if visited.contains(&edge.source_account) {
            continue; // defensive cycle guard; the DAG invariant should prevent this.
        }
        visited.insert(edge.source_account.clone());
        path.push(Endpoint::sink(current_account));
        path.push(Endpoint::source(edge.source_account.as_str()));

        let next_weight = weight_so_far.checked_mul(&edge.amount);
        walk(
            dag,
            &edge.source_account,
            next_weight,
            path,
            visited,
            results,
            budget,
        )?;

        path.pop();
        path.pop();
        visited.remove(&edge.source_account);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(n: i64) -> Decimal {
        Decimal::from_i64(n)
    }

    #[test]
    fn single_hop_weight_is_the_candidate_amount() {
        let mut dag = Dag::new();
        dag.add_account("s").unwrap();
        dag.add_account("t").unwrap();
        let paths = enumerate_reverse_paths(&dag, "s", "t", &amt(42), EnumerationBudget::default())
            .unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].weight, amt(42));
        assert_eq!(paths[0].endpoints.len(), 2);
    }

    #[test]
    fn multiple_antecedents_produce_multiple_paths() {
        let mut dag = Dag::new();
        for acct in ["x", "y", "a", "b"] {
            dag.add_account(acct).unwrap();
        }
        dag.commit_edge("x", "a", amt(3), 1).unwrap();
        dag.commit_edge("y", "a", amt(5), 2).unwrap();

        let paths = enumerate_reverse_paths(&dag, "a", "b", &amt(10), EnumerationBudget::default())
            .unwrap();

        assert_eq!(paths.len(), 2);
        let weights: Vec<_> = paths.iter().map(|p| p.weight.clone()).collect();
        assert!(weights.iter().any(|w| *w == amt(30))); // 10 * 3
        assert!(weights.iter().any(|w| *w == amt(50))); // 10 * 5
    }

    #[test]
    fn chained_antecedents_multiply_every_hop() {
        let mut dag = Dag::new();
        for acct in ["x", "a", "b"] {
            dag.add_account(acct).unwrap();
        }
        dag.commit_edge("x", "a", amt(2), 1).unwrap();

        let paths = enumerate_reverse_paths(&dag, "a", "b", &amt(10), EnumerationBudget::default())
            .unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].weight, amt(20));
        assert_eq!(paths[0].endpoints.len(), 4);
    }

    #[test]
    fn path_budget_is_enforced() {
        let mut dag = Dag::new();
        for acct in ["x", "y", "a", "b"] {
            dag.add_account(acct).unwrap();
        }
        dag.commit_edge("x", "a", amt(3), 1).unwrap();
        dag.commit_edge("y", "a", amt(5), 2).unwrap();

        let tight_budget = EnumerationBudget {
            max_paths_per_transaction: 1,
            max_path_length: 100,
        };
        let err = enumerate_reverse_paths(&dag, "a", "b", &amt(10), tight_budget).unwrap_err();
        assert!(matches!(
            err,
            GraphError::EnumerationBudgetExceeded { limit: 1 }
        ));
    }

    #[test]
    fn path_length_budget_is_enforced() {
        let mut dag = Dag::new();
        dag.add_account("x").unwrap();
        dag.add_account("a").unwrap();
        dag.add_account("b").unwrap();
        dag.commit_edge("x", "a", amt(2), 1).unwrap();

        let tight_budget = EnumerationBudget {
            max_paths_per_transaction: 10_000,
            max_path_length: 2,
        };
        let err = enumerate_reverse_paths(&dag, "a", "b", &amt(10), tight_budget).unwrap_err();
        assert!(matches!(
            err,
            GraphError::EnumerationBudgetExceeded { limit: 2 }
        ));
    }
}
