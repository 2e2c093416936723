use std::collections::HashSet;

use icgs_decimal::Decimal;
use icgs_graph::ClassificationResult;

use crate::error::LpError;
use crate::measure::{Measure, MeasureKind};
use crate::problem::{Constraint, ConstraintRelation, LpProblem, Objective};

/// Builds an [`LpProblem`] from a classification result and the measures
/// that govern a candidate transaction.
///
/// One non-negative variable `f_q` is created per path equivalence class
/// that appears in `classification`. Every measure becomes one constraint
/// row over the classes whose pattern was registered under that measure id;
/// measures with no matching classes in this transaction still produce a
/// (trivially empty) row rather than being silently skipped, so feasibility
/// failures are traceable to a named measure. A flow-conservation row and
/// non-negativity (implicit in every variable's bound) complete the model.
pub struct LpBuilder;

impl LpBuilder {
    pub fn build(
        measures: &[Measure],
        classification: &ClassificationResult,
        amount: &Decimal,
        objective: Objective,
    ) -> Result<LpProblem, LpError> {
        let mut seen_measure_ids = HashSet::new();
        for measure in measures {
            if !seen_measure_ids.insert(measure.id.clone()) {
                return Err(LpError::DuplicateMeasure(measure.id.clone()));
            }
        }

        let mut variables: Vec<usize> = classification.classes.keys().copied().collect();
        variables.sort_unstable();

        let mut constraints = Vec::with_capacity(measures.len() + 1);

        for measure in measures {
            let mut terms: Vec<(usize, Decimal)> = classification
                .classes
                .values()
                .filter(|class| class.measure_id == measure.id)
                .map(|class| (class.class_id, class.coefficient.clone()))
                .collect();
            terms.sort_unstable_by_key(|(id, _)| *id);

            let relation = match measure.kind {
                MeasureKind::SourceDebit => ConstraintRelation::Le,
                MeasureKind::TargetCredit => ConstraintRelation::Ge,
                MeasureKind::Secondary(r) => r.into(),
            };

            constraints.push(Constraint {
                label: measure.id.clone(),
                terms,
                relation,
                rhs: measure.value.clone(),
            });
        }

        let flow_conservation_terms: Vec<(usize, Decimal)> = variables
            .iter()
            .map(|&class_id| (class_id, Decimal::from_i64(1)))
            .collect();
        constraints.push(Constraint {
            label: "flow-conservation".to_string(),
            terms: flow_conservation_terms,
            relation: ConstraintRelation::Eq,
            rhs: amount.clone(),
        });

        Ok(LpProblem {
            variables,
            objective,
            constraints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Relation;
    use icgs_graph::EquivalenceClass;

    fn amt(n: i64) -> Decimal {
        Decimal::from_i64(n)
    }

    fn classification_with(classes: Vec<EquivalenceClass>) -> ClassificationResult {
        let mut result = ClassificationResult::default();
        for class in classes {
            result.classes.insert(class.class_id, class);
        }
        result
    }

    #[test]
    fn builds_one_variable_per_class_and_a_flow_conservation_row() {
        let classification = classification_with(vec![
            EquivalenceClass {
                class_id: 1,
                measure_id: "source".to_string(),
                coefficient: amt(1),
                pattern: "A".to_string(),
                accumulated_weight: amt(30),
            },
            EquivalenceClass {
                class_id: 2,
                measure_id: "target".to_string(),
                coefficient: amt(1),
                pattern: "B".to_string(),
                accumulated_weight: amt(70),
            },
        ]);
        let measures = vec![
            Measure::source_debit("source", amt(100)),
            Measure::target_credit("target", amt(50)),
        ];

        let problem =
            LpBuilder::build(&measures, &classification, &amt(100), Objective::Feasibility).unwrap();

        assert_eq!(problem.variables, vec![1, 2]);
        let flow_row = problem
            .constraints
            .iter()
            .find(|c| c.label == "flow-conservation")
            .unwrap();
        assert_eq!(flow_row.rhs, amt(100));
        assert_eq!(flow_row.terms.len(), 2);
    }

    #[test]
    fn measure_with_no_matching_class_still_produces_a_row() {
        let classification = classification_with(vec![]);
        let measures = vec![Measure::source_debit("source", amt(100))];
        let problem =
            LpBuilder::build(&measures, &classification, &amt(0), Objective::Feasibility).unwrap();
        let row = problem
            .constraints
            .iter()
            .find(|c| c.label == "source")
            .unwrap();
        assert!(row.terms.is_empty());
    }

    #[test]
    fn duplicate_measure_ids_are_rejected() {
        let classification = classification_with(vec![]);
        let measures = vec![
            Measure::source_debit("dup", amt(10)),
            Measure::secondary("dup", Relation::Ge, amt(1)),
        ];
        let err = LpBuilder::build(&measures, &classification, &amt(0), Objective::Feasibility)
            .unwrap_err();
        assert!(matches!(err, LpError::DuplicateMeasure(_)));
    }
}
