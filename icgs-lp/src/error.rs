use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LpError {
    #[error("measure id {0:?} is used by more than one measure definition")]
    DuplicateMeasure(String),
}
