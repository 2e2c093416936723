use crate::ast::AstNode;
use crate::matcher::CharMatcher;
use crate::nfa::StateArena;

/// A Thompson fragment: single entry state, single exit state, no
/// transitions leaving the fragment except through `end`.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
}

/// Compiles an AST node into a fragment within `arena`, following the
/// classic Thompson construction. Character classes compile to a single
/// `CharMatcher::Class` transition rather than an alternation of literals.
pub fn build(node: &AstNode, arena: &mut StateArena) -> Fragment {
    match node {
        AstNode::Empty => {
            let s = arena.alloc();
            Fragment { start: s, end: s }
        }
        AstNode::Literal(c) => {
            let start = arena.alloc();
            let end = arena.alloc();
            arena.add_transition(start, CharMatcher::Literal(*c), end);
            Fragment { start, end }
        }
        AstNode::Class { items, negated } => {
            let start = arena.alloc();
            let end = arena.alloc();
            arena.add_transition(
                start,
                CharMatcher::Class {
                    items: items.clone(),
                    negated: *negated,
                },
                end,
            );
            Fragment { start, end }
        }
        AstNode::Concat(parts) => {
            let mut iter = parts.iter();
            let first = iter
                .next()
                .map(|n| build(n, arena))
                .unwrap_or_else(|| build(&AstNode::Empty, arena));
            let mut acc = first;
            for part in iter {
                let next = build(part, arena);
                arena.add_epsilon(acc.end, next.start);
                acc = Fragment {
                    start: acc.start,
                    end: next.end,
                };
            }
            acc
        }
        AstNode::Alt(branches) => {
            let start = arena.alloc();
            let end = arena.alloc();
            for branch in branches {
                let frag = build(branch, arena);
                arena.add_epsilon(start, frag.start);
                arena.add_epsilon(frag.end, end);
            }
            Fragment { start, end }
        }
        AstNode::Star(inner) => {
            let start = arena.alloc();
            let end = arena.alloc();
            let frag = build(inner, arena);
            arena.add_epsilon(start, frag.start);
            arena.add_epsilon(start, end);
            arena.add_epsilon(frag.end, frag.start);
            arena.add_epsilon(frag.end, end);
            Fragment { start, end }
        }
        AstNode::Plus(inner) => {
            let frag = build(inner, arena);
            let end = arena.alloc();
            arena.add_epsilon(frag.end, frag.start);
            arena.add_epsilon(frag.end, end);
            Fragment {
                start: frag.start,
                end,
            }
        }
        AstNode::Optional(inner) => {
            let start = arena.alloc();
            let end = arena.alloc();
            let frag = build(inner, arena);
            arena.add_epsilon(start, frag.start);
            arena.add_epsilon(start, end);
            arena.add_epsilon(frag.end, end);
            Fragment { start, end }
        }
    }
}
