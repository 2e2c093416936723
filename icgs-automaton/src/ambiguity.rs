//! Ambiguity detection between a candidate pattern and the patterns already
//! registered on a classifier.
//!
//! Two patterns are ambiguous if their accepted languages intersect: some
//! word would then drive the combined automaton to two different final
//! states, leaving the measure and weight of a matching word undefined.
//!
//! Checking language intersection exactly requires reasoning over the full
//! alphabet, which for character classes can be enormous. Instead we build a
//! *representative alphabet*: every character that appears as a literal or a
//! class-range boundary in either pattern, plus one sentinel character
//! standing in for "everything else". Two regular languages built only from
//! literals and ranges can only disagree on membership at a boundary point
//! or uniformly off every range, so this alphabet is sufficient whenever
//! patterns use a single layer of character classes; patterns that combine
//! multiple classes in data-dependent ways may in principle escape this
//! check, which is a known heuristic limitation.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::ast::{AstNode, ClassItem};
use crate::error::AutomatonError;
use crate::nfa::StateArena;
use crate::parser;
use crate::sim;
use crate::thompson;

/// Returns `Ok(true)` if `candidate` accepts any word also accepted by one
/// of `existing` (already-validated pattern strings).
pub fn overlaps_existing<'a>(
    candidate: &AstNode,
    existing: impl Iterator<Item = &'a str>,
) -> Result<bool, AutomatonError> {
    for pattern in existing {
        let other_ast = parser::parse(pattern)?;
        if languages_intersect(candidate, &other_ast) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn representative_alphabet(a: &AstNode, b: &AstNode) -> Vec<char> {
    let mut boundaries = BTreeSet::new();
    collect_boundaries(a, &mut boundaries);
    collect_boundaries(b, &mut boundaries);

    let mut alphabet: Vec<char> = boundaries.into_iter().collect();

    // A sentinel representing every character not already in the alphabet.
    let mut sentinel = '\u{10FFFF}';
    while alphabet.contains(&sentinel) {
        let next = (sentinel as u32).saturating_sub(1);
        sentinel = char::from_u32(next).unwrap_or('\u{0}');
    }
    alphabet.push(sentinel);
    alphabet
}

fn collect_boundaries(node: &AstNode, out: &mut BTreeSet<char>) {
    match node {
        AstNode::Empty => {}
        AstNode::Literal(c) => {
            out.insert(*c);
        }
        AstNode::Class { items, .. } => {
            for item in items {
                match item {
                    ClassItem::Char(c) => {
                        out.insert(*c);
                    }
                    ClassItem::Range(lo, hi) => {
                        out.insert(*lo);
                        out.insert(*hi);
                        if let Some(just_below) = char::from_u32(*lo as u32).and_then(|_| {
                            (*lo as u32).checked_sub(1).and_then(char::from_u32)
                        }) {
                            out.insert(just_below);
                        }
                        if let Some(just_above) = char::from_u32((*hi as u32).saturating_add(1)) {
                            out.insert(just_above);
                        }
                    }
                }
            }
        }
        AstNode::Concat(parts) | AstNode::Alt(parts) => {
            for part in parts {
                collect_boundaries(part, out);
            }
        }
        AstNode::Star(inner) | AstNode::Plus(inner) | AstNode::Optional(inner) => {
            collect_boundaries(inner, out);
        }
    }
}

struct MiniNfa {
    arena: StateArena,
    start: usize,
    accept: usize,
}

fn compile(ast: &AstNode) -> MiniNfa {
    let mut arena = StateArena::default();
    let fragment = thompson::build(ast, &mut arena);
    MiniNfa {
        arena,
        start: fragment.start,
        accept: fragment.end,
    }
}

fn closure_of(nfa: &MiniNfa, seed: usize) -> BTreeSet<usize> {
    let mut set = BTreeSet::from([seed]);
    sim::epsilon_closure(nfa.arena.states(), &mut set);
    set
}

/// Breadth-first search over pairs of active-state sets, i.e. the standard
/// product-automaton construction, stopping as soon as both automata are
/// simultaneously in an accepting configuration.
fn languages_intersect(a: &AstNode, b: &AstNode) -> bool {
    let nfa_a = compile(a);
    let nfa_b = compile(b);
    let alphabet = representative_alphabet(a, b);

    let start_a = closure_of(&nfa_a, nfa_a.start);
    let start_b = closure_of(&nfa_b, nfa_b.start);

    let accepts = |set: &BTreeSet<usize>, accept: usize| set.contains(&accept);

    if accepts(&start_a, nfa_a.accept) && accepts(&start_b, nfa_b.accept) {
        return true;
    }

    let mut visited: HashSet<(BTreeSet<usize>, BTreeSet<usize>)> = HashSet::new();
    let mut queue: VecDeque<(BTreeSet<usize>, BTreeSet<usize>)> = VecDeque::new();
    visited.insert((start_a.clone(), start_b.clone()));
    queue.push_back((start_a, start_b));

    while let Some((active_a, active_b)) = queue.pop_front() {
        for &c in &alphabet {
            let moved_a = sim::step(nfa_a.arena.states(), &active_a, c);
            let moved_b = sim::step(nfa_b.arena.states(), &active_b, c);
            if moved_a.is_empty() || moved_b.is_empty() {
                continue;
            }
            let mut next_a = moved_a;
            sim::epsilon_closure(nfa_a.arena.states(), &mut next_a);
            let mut next_b = moved_b;
            sim::epsilon_closure(nfa_b.arena.states(), &mut next_b);

            if accepts(&next_a, nfa_a.accept) && accepts(&next_b, nfa_b.accept) {
                return true;
            }

            let key = (next_a.clone(), next_b.clone());
            if visited.insert(key) {
                queue.push_back((next_a, next_b));
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn intersects(p1: &str, p2: &str) -> bool {
        let a = parser::parse(p1).unwrap();
        let b = parser::parse(p2).unwrap();
        languages_intersect(&a, &b)
    }

    #[test]
    fn identical_patterns_overlap() {
        assert!(intersects("CLIENT[0-9]+", "CLIENT[0-9]+"));
    }

    #[test]
    fn disjoint_prefixes_do_not_overlap() {
        assert!(!intersects("CLIENT[0-9]+", "VENDOR[0-9]+"));
    }

    #[test]
    fn subset_pattern_overlaps() {
        assert!(intersects("a+", "a"));
    }

    #[test]
    fn disjoint_character_classes_do_not_overlap() {
        assert!(!intersects("[A-M]+", "[N-Z]+"));
    }

    #[test]
    fn adjacent_character_classes_do_not_overlap() {
        assert!(!intersects("[A-M]", "[N-Z]"));
    }
}
