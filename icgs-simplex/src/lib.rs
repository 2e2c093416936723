//! Two-phase exact-arithmetic Simplex over [`icgs_lp::LpProblem`], with
//! Bland's-rule anti-cycling, pivot-stability classification for warm-start
//! trust decisions, and cross-validation against an independent cold-start
//! solve whenever that stability is in doubt.

mod error;
mod phase;
mod pivot;
mod solve;
mod stability;
mod standard_form;

pub use error::SimplexError;
pub use phase::PhaseOutcome;
pub use solve::{solve, SimplexSolution, SimplexStatus, WarmStartPolicy};
pub use stability::{PivotStability, StabilityThresholds};
pub use standard_form::{build as build_standard_form, ColumnKind, StandardForm};
