use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecimalError {
    #[error("cannot parse decimal literal {0:?}")]
    Parse(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("target scale {0} exceeds the maximum supported scale")]
    ScaleOverflow(u32),
}
