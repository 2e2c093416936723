//! Regex pattern compilation and weighted, anchored NFA evaluation.
//!
//! Patterns are compiled via Thompson construction into a single shared NFA
//! per classifier. Matching is implicitly anchored to the full word, and
//! patterns that would make a word's measure ambiguous are rejected at
//! registration time rather than at evaluation time.

mod ambiguity;
mod ast;
mod error;
mod matcher;
mod nfa;
mod parser;
mod sim;
mod thompson;

pub use ast::{AstNode, ClassItem};
pub use error::AutomatonError;
pub use matcher::CharMatcher;
pub use nfa::{Label, WeightedNfa};
