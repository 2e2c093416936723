use thiserror::Error;

use icgs_automaton::AutomatonError;
use icgs_graph::GraphError;
use icgs_lp::LpError;
use icgs_simplex::SimplexError;
use icgs_taxonomy::TaxonomyError;

/// Errors returned directly from a build-time call (registration, pattern
/// compilation). Never returned from `submit` — in-pipeline failures become
/// a `Rejected{reason}` outcome instead, per the propagation policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Automaton(#[from] AutomatonError),
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error(transparent)]
    Lp(#[from] LpError),
    #[error("account {0:?} already exists")]
    DuplicateAccount(String),
    #[error("account {0:?} is unknown")]
    UnknownAccount(String),
    #[error("the classifier is frozen; build a fresh engine to register more patterns")]
    ClassifierFrozen,
    #[error("the classifier must be frozen before a transaction can be submitted")]
    ClassifierNotFrozen,
}

/// Why an in-flight transaction failed to commit. Carried inside
/// [`crate::outcome::SubmitOutcome::Rejected`] rather than returned as an
/// `Err`, so a rejection is observable state, not a propagated failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    EnumerationBudgetExceeded { limit: usize },
    Infeasible,
    Unbounded,
    MaxIterations(usize),
    ValidationMismatch(String),
    Timeout,
    Taxonomy(TaxonomyError),
    Other(String),
}

impl From<GraphError> for RejectionReason {
    fn from(value: GraphError) -> Self {
        match value {
            GraphError::EnumerationBudgetExceeded { limit } => {
                RejectionReason::EnumerationBudgetExceeded { limit }
            }
            GraphError::Taxonomy(inner) => RejectionReason::Taxonomy(inner),
            other => RejectionReason::Other(other.to_string()),
        }
    }
}

impl From<SimplexError> for RejectionReason {
    fn from(value: SimplexError) -> Self {
        match value {
            SimplexError::Infeasible => RejectionReason::Infeasible,
            SimplexError::Unbounded => RejectionReason::Unbounded,
            SimplexError::MaxIterations(cap) => RejectionReason::MaxIterations(cap),
            SimplexError::ValidationMismatch(msg) => RejectionReason::ValidationMismatch(msg),
        }
    }
}

impl From<LpError> for RejectionReason {
    fn from(value: LpError) -> Self {
        RejectionReason::Other(value.to_string())
    }
}

impl From<TaxonomyError> for RejectionReason {
    fn from(value: TaxonomyError) -> Self {
        RejectionReason::Taxonomy(value)
    }
}
