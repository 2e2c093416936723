use std::collections::HashMap;

use icgs_automaton::WeightedNfa;
use icgs_decimal::Decimal;
use icgs_taxonomy::TaxonomyHistory;

use crate::enumerate::EnumeratedPath;
use crate::error::GraphError;

/// One path equivalence class: every path whose word classified to the same
/// NFA final state, with the class's measure, its fixed per-unit weight
/// (the final state's own weight), and the total path weight accumulated
/// into it.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceClass {
    pub class_id: usize,
    pub measure_id: String,
    pub coefficient: Decimal,
    pub pattern: String,
    pub accumulated_weight: Decimal,
}

/// The outcome of classifying every enumerated path for one candidate
/// transaction: each final state's accumulated equivalence class, plus
/// diagnostics about paths the NFA did not recognize.
#[derive(Debug, Clone, Default)]
pub struct ClassificationResult {
    pub classes: HashMap<usize, EquivalenceClass>,
    pub classified_path_count: usize,
    pub unclassified_path_count: usize,
}

/// Computes each path's word at `transaction_number` via the taxonomy, runs
/// it through the frozen `nfa`, and accumulates its weight into the
/// equivalence class (final state) its word classified to. Paths the NFA
/// rejects are dropped from the accumulation but counted for diagnostics.
///
/// Reads the taxonomy non-consultingly: classifying a candidate transaction
/// must not freeze a tentative snapshot that the caller may still need to
/// roll back.
pub fn classify_paths(
    paths: &[EnumeratedPath],
    nfa: &WeightedNfa,
    taxonomy: &TaxonomyHistory,
    transaction_number: u64,
) -> Result<ClassificationResult, GraphError> {
    let mut result = ClassificationResult::default();

    for path in paths {
        let word = taxonomy.peek_path_to_word(&path.endpoints, transaction_number)?;
        match nfa.evaluate(&word) {
            Some(label) => {
                result.classified_path_count += 1;
                let entry = result
                    .classes
                    .entry(label.class_id)
                    .or_insert_with(|| EquivalenceClass {
                        class_id: label.class_id,
                        measure_id: label.measure_id.clone(),
                        coefficient: label.weight.clone(),
                        pattern: label.pattern.clone(),
                        accumulated_weight: Decimal::zero(),
                    });
                entry.accumulated_weight = entry.accumulated_weight.checked_add(&path.weight);
            }
            None => {
                result.unclassified_path_count += 1;
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use icgs_taxonomy::Endpoint;
    use std::collections::BTreeMap;

    fn amt(n: i64) -> Decimal {
        Decimal::from_i64(n)
    }

    #[test]
    fn classifies_into_the_matching_measure() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("BA", "M1", amt(1)).unwrap();
        nfa.freeze();

        let mut taxonomy = TaxonomyHistory::new();
        let mut mapping = BTreeMap::new();
        mapping.insert("acct-a".to_string(), Some('A'));
        mapping.insert("acct-b".to_string(), Some('B'));
        taxonomy.update(&mapping, 1, None).unwrap();

        let paths = vec![EnumeratedPath {
            endpoints: vec![Endpoint::sink("acct-b"), Endpoint::source("acct-a")],
            weight: amt(7),
        }];

        let result = classify_paths(&paths, &nfa, &taxonomy, 1).unwrap();
        assert_eq!(result.classified_path_count, 1);
        assert_eq!(result.unclassified_path_count, 0);
        assert_eq!(result.classes.len(), 1);
        let class = result.classes.values().next().unwrap();
        assert_eq!(class.measure_id, "M1");
        assert_eq!(class.accumulated_weight, amt(7));
    }

    #[test]
    fn unclassified_paths_are_counted_not_silently_dropped() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("ZZ", "M1", amt(1)).unwrap();
        nfa.freeze();

        let mut taxonomy = TaxonomyHistory::new();
        let mut mapping = BTreeMap::new();
        mapping.insert("acct-a".to_string(), Some('A'));
        mapping.insert("acct-b".to_string(), Some('B'));
        taxonomy.update(&mapping, 1, None).unwrap();

        let paths = vec![EnumeratedPath {
            endpoints: vec![Endpoint::sink("acct-b"), Endpoint::source("acct-a")],
            weight: amt(7),
        }];

        let result = classify_paths(&paths, &nfa, &taxonomy, 1).unwrap();
        assert_eq!(result.classified_path_count, 0);
        assert_eq!(result.unclassified_path_count, 1);
        assert!(result.classes.is_empty());
    }

    #[test]
    fn accumulates_weight_across_multiple_paths_in_the_same_class() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("BA", "M1", amt(1)).unwrap();
        nfa.freeze();

        let mut taxonomy = TaxonomyHistory::new();
        let mut mapping = BTreeMap::new();
        mapping.insert("acct-a".to_string(), Some('A'));
        mapping.insert("acct-b".to_string(), Some('B'));
        taxonomy.update(&mapping, 1, None).unwrap();

        let paths = vec![
            EnumeratedPath {
                endpoints: vec![Endpoint::sink("acct-b"), Endpoint::source("acct-a")],
                weight: amt(3),
            },
            EnumeratedPath {
                endpoints: vec![Endpoint::sink("acct-b"), Endpoint::source("acct-a")],
                weight: amt(4),
            },
        ];

        let result = classify_paths(&paths, &nfa, &taxonomy, 1).unwrap();
        assert_eq!(result.classes.len(), 1);
        assert_eq!(
            result.classes.values().next().unwrap().accumulated_weight,
            amt(7)
        );
    }

    #[test]
    fn distinct_patterns_in_the_same_measure_stay_separate_classes() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("BA", "M1", amt(1)).unwrap();
        nfa.add_pattern("DC", "M1", amt(2)).unwrap();
        nfa.freeze();

        let mut taxonomy = TaxonomyHistory::new();
        let mut mapping = BTreeMap::new();
        mapping.insert("a".to_string(), Some('A'));
        mapping.insert("b".to_string(), Some('B'));
        mapping.insert("c".to_string(), Some('C'));
        mapping.insert("d".to_string(), Some('D'));
        taxonomy.update(&mapping, 1, None).unwrap();

        let paths = vec![
            EnumeratedPath {
                endpoints: vec![Endpoint::sink("b"), Endpoint::source("a")],
                weight: amt(3),
            },
            EnumeratedPath {
                endpoints: vec![Endpoint::sink("d"), Endpoint::source("c")],
                weight: amt(5),
            },
        ];

        let result = classify_paths(&paths, &nfa, &taxonomy, 1).unwrap();
        assert_eq!(result.classes.len(), 2);
        for class in result.classes.values() {
            assert_eq!(class.measure_id, "M1");
        }
    }
}
