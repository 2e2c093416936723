use std::collections::BTreeSet;

use icgs_decimal::Decimal;

use crate::ambiguity;
use crate::error::AutomatonError;
use crate::matcher::CharMatcher;
use crate::parser;
use crate::sim;
use crate::thompson;

/// A final-state label: which measure a pattern contributes to, the weight
/// a matching word contributes to that measure's flow, and the final
/// state's own id. `class_id` is the stable identity of the path
/// equivalence class a matching word belongs to — a single measure may own
/// several final states (several patterns), each its own class with its
/// own weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub class_id: usize,
    pub measure_id: String,
    pub weight: Decimal,
    pub pattern: String,
}

#[derive(Debug, Clone, Default)]
pub struct StateData {
    pub(crate) epsilons: Vec<usize>,
    pub(crate) transitions: Vec<(CharMatcher, usize)>,
    pub(crate) label: Option<Label>,
}

/// Growable backing store for NFA states, shared by the Thompson builder
/// while a pattern is under construction.
#[derive(Debug, Default)]
pub struct StateArena {
    states: Vec<StateData>,
}

impl StateArena {
    pub fn alloc(&mut self) -> usize {
        self.states.push(StateData::default());
        self.states.len() - 1
    }

    pub fn add_epsilon(&mut self, from: usize, to: usize) {
        self.states[from].epsilons.push(to);
    }

    pub fn add_transition(&mut self, from: usize, matcher: CharMatcher, to: usize) {
        self.states[from].transitions.push((matcher, to));
    }

    pub(crate) fn states(&self) -> &[StateData] {
        &self.states
    }
}

/// One registered pattern, retained so a later pattern can be checked for
/// ambiguity against everything accepted so far.
#[derive(Debug, Clone)]
struct RegisteredPattern {
    measure_id: String,
    pattern: String,
}

/// A single weighted, anchored NFA over the union of all registered
/// patterns. Matching is implicitly anchored: `evaluate` only accepts a
/// word that drives the automaton from its start state to a labelled final
/// state while consuming every character, equivalent to wrapping every
/// pattern in `^...$` without ever materializing those tokens.
#[derive(Debug)]
pub struct WeightedNfa {
    arena: StateArena,
    start: usize,
    frozen: bool,
    patterns: Vec<RegisteredPattern>,
}

impl Default for WeightedNfa {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedNfa {
    pub fn new() -> Self {
        let mut arena = StateArena::default();
        let start = arena.alloc();
        WeightedNfa {
            arena,
            start,
            frozen: false,
            patterns: Vec::new(),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Registers `pattern` under `measure_id` with the given `weight`,
    /// returning the id of the final state it compiled to (the path
    /// equivalence class's stable identity).
    ///
    /// Rejects the pattern if the classifier is frozen, if the pattern fails
    /// to parse, or if its accepted language overlaps with any
    /// already-registered pattern (see [`ambiguity`]).
    pub fn add_pattern(
        &mut self,
        pattern: &str,
        measure_id: &str,
        weight: Decimal,
    ) -> Result<usize, AutomatonError> {
        if self.frozen {
            return Err(AutomatonError::Frozen);
        }
        let ast = parser::parse(pattern)?;

        let existing = self
            .patterns
            .iter()
            .filter(|p| p.measure_id == measure_id)
            .map(|p| p.pattern.as_str());
        if ambiguity::overlaps_existing(&ast, existing)? {
            return Err(AutomatonError::AmbiguousPattern {
                measure_id: measure_id.to_string(),
            });
        }

        let fragment = thompson::build(&ast, &mut self.arena);
        self.arena.add_epsilon(self.start, fragment.start);
        self.arena.states[fragment.end].label = Some(Label {
            class_id: fragment.end,
            measure_id: measure_id.to_string(),
            weight,
            pattern: pattern.to_string(),
        });
        self.patterns.push(RegisteredPattern {
            measure_id: measure_id.to_string(),
            pattern: pattern.to_string(),
        });
        Ok(fragment.end)
    }

    /// Evaluates `word` against the frozen automaton, returning the label of
    /// the unique accepting final state, or `None` if no registered pattern
    /// fully matches the word.
    ///
    /// Because patterns are checked for mutual exclusivity at registration
    /// time, at most one accepting final state can ever be reached.
    pub fn evaluate(&self, word: &str) -> Option<&Label> {
        let mut active: BTreeSet<usize> = BTreeSet::from([self.start]);
        sim::epsilon_closure(&self.arena.states, &mut active);

        for c in word.chars() {
            let moved = sim::step(&self.arena.states, &active, c);
            if moved.is_empty() {
                return None;
            }
            active = moved;
            sim::epsilon_closure(&self.arena.states, &mut active);
        }

        active
            .iter()
            .find_map(|&id| self.arena.states[id].label.as_ref())
    }

    /// Evaluates `word` and returns every accepting label, for diagnostics
    /// and for the ambiguity checker's own tests. Normal callers should use
    /// [`WeightedNfa::evaluate`].
    pub fn evaluate_all(&self, word: &str) -> Vec<&Label> {
        let mut active: BTreeSet<usize> = BTreeSet::from([self.start]);
        sim::epsilon_closure(&self.arena.states, &mut active);

        for c in word.chars() {
            let moved = sim::step(&self.arena.states, &active, c);
            if moved.is_empty() {
                return Vec::new();
            }
            active = moved;
            sim::epsilon_closure(&self.arena.states, &mut active);
        }

        active
            .iter()
            .filter_map(|&id| self.arena.states[id].label.as_ref())
            .collect()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icgs_decimal::Decimal;

    fn w(n: i64) -> Decimal {
        Decimal::from_i64(n)
    }

    #[test]
    fn matches_are_anchored() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("ab", "M1", w(1)).unwrap();
        nfa.freeze();
        assert!(nfa.evaluate("ab").is_some());
        assert!(nfa.evaluate("abc").is_none());
        assert!(nfa.evaluate("a").is_none());
    }

    #[test]
    fn star_and_alternation() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("a(b|c)*", "M1", w(2)).unwrap();
        nfa.freeze();
        assert!(nfa.evaluate("a").is_some());
        assert!(nfa.evaluate("abcbcb").is_some());
        assert!(nfa.evaluate("abd").is_none());
    }

    #[test]
    fn character_class_matches_without_expansion() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("[A-Z]+", "M1", w(1)).unwrap();
        nfa.freeze();
        assert!(nfa.evaluate("ACME").is_some());
        assert!(nfa.evaluate("acme").is_none());
    }

    #[test]
    fn frozen_rejects_further_mutation() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("a", "M1", w(1)).unwrap();
        nfa.freeze();
        let err = nfa.add_pattern("b", "M2", w(1)).unwrap_err();
        assert!(matches!(err, AutomatonError::Frozen));
    }

    #[test]
    fn overlapping_patterns_in_the_same_measure_are_rejected() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("a+", "M1", w(1)).unwrap();
        // "a" is in the language of "a+", so within the same measure this
        // must be rejected.
        let err = nfa.add_pattern("a", "M1", w(1)).unwrap_err();
        assert!(matches!(err, AutomatonError::AmbiguousPattern { .. }));
    }

    #[test]
    fn overlapping_patterns_across_different_measures_are_both_registered() {
        // Each measure is classified independently: a word may match finals
        // belonging to two different measures without ambiguity, since
        // `evaluate` still yields one final state overall (smallest id).
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("a+", "M1", w(1)).unwrap();
        nfa.add_pattern("a", "M2", w(1)).unwrap();
        nfa.freeze();
        assert!(nfa.evaluate("a").is_some());
    }

    #[test]
    fn disjoint_patterns_are_both_evaluable() {
        let mut nfa = WeightedNfa::new();
        nfa.add_pattern("CLIENT[0-9]+", "M1", w(1)).unwrap();
        nfa.add_pattern("VENDOR[0-9]+", "M2", w(1)).unwrap();
        nfa.freeze();
        assert_eq!(nfa.evaluate("CLIENT42").unwrap().measure_id, "M1");
        assert_eq!(nfa.evaluate("VENDOR7").unwrap().measure_id, "M2");
        assert!(nfa.evaluate("OTHER1").is_none());
    }
}
