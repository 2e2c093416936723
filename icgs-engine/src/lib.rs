//! Orchestrates the full ICGS validation pipeline over the lower crates:
//! public account/pattern registration, the `submit` state machine
//! (enumerate, classify, build, solve, commit-or-reject), configuration,
//! and the error/outcome types a caller sees at the boundary.

pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;

pub use config::{EngineConfig, DEFAULT_DECIMAL_SCALE, DEFAULT_MAX_PATHS_PER_TRANSACTION, DEFAULT_MAX_PATH_LENGTH, DEFAULT_MAX_SIMPLEX_ITERATIONS};
pub use engine::{Engine, SubmitMode};
pub use error::{EngineError, RejectionReason};
pub use outcome::{CommitRecord, PipelineStage, PipelineTrace, SubmitOptions, SubmitOutcome, TraceEvent};

pub use icgs_decimal::{Decimal, DecimalError};
pub use icgs_lp::{Measure, MeasureKind, OptimizationSense, Relation};
pub use icgs_simplex::{PivotStability, SimplexSolution, SimplexStatus, WarmStartPolicy};
