//! The committed-edge DAG, reverse path enumeration from a candidate edge,
//! and classification of enumerated paths against a frozen weighted NFA.

mod classify;
mod dag;
mod enumerate;
mod error;

pub use classify::{classify_paths, ClassificationResult, EquivalenceClass};
pub use dag::{Dag, Edge};
pub use enumerate::{enumerate_reverse_paths, EnumerationBudget, EnumeratedPath};
pub use error::GraphError;

pub use icgs_taxonomy::{Endpoint, Side};
