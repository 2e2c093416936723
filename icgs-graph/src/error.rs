use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("account {0:?} is unknown")]
    UnknownAccount(String),
    #[error("account {0:?} already exists")]
    DuplicateAccount(String),
    #[error("enumeration exceeded its budget: {limit}")]
    EnumerationBudgetExceeded { limit: usize },
    #[error(transparent)]
    Taxonomy(#[from] icgs_taxonomy::TaxonomyError),
}
