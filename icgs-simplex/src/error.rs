use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimplexError {
    #[error("problem is infeasible (phase 1 residual exceeds epsilon)")]
    Infeasible,
    #[error("problem is unbounded")]
    Unbounded,
    #[error("simplex exceeded the maximum iteration count of {0}")]
    MaxIterations(usize),
    #[error("cross-validation disagreed with the primary solve: {0}")]
    ValidationMismatch(String),
}
