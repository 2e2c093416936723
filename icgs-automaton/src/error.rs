use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AutomatonError {
    #[error("pattern syntax error: {0}")]
    PatternSyntax(String),
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),
    #[error("cannot mutate a frozen classifier")]
    Frozen,
    #[error("pattern for measure {measure_id:?} is ambiguous with an existing pattern in the same measure")]
    AmbiguousPattern { measure_id: String },
}
