/// Which side of an account a DAG edge terminates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Source,
    Sink,
}

/// A `(account_id, side)` pair identifying one endpoint of a DAG edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Endpoint {
    pub account_id: String,
    pub side: Side,
}

impl Endpoint {
    pub fn new(account_id: impl Into<String>, side: Side) -> Self {
        Endpoint {
            account_id: account_id.into(),
            side,
        }
    }

    pub fn source(account_id: impl Into<String>) -> Self {
        Self::new(account_id, Side::Source)
    }

    pub fn sink(account_id: impl Into<String>) -> Self {
        Self::new(account_id, Side::Sink)
    }
}
