//! Measure model and LP problem construction from a path classification.

mod builder;
mod error;
mod measure;
mod problem;

pub use builder::LpBuilder;
pub use error::LpError;
pub use measure::{Measure, MeasureKind, Relation};
pub use problem::{Constraint, ConstraintRelation, LpProblem, Objective, OptimizationSense};
