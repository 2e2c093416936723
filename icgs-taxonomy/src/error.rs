use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("character set {0:?} is already defined")]
    DuplicateSet(String),
    #[error("character set {0:?} is unknown")]
    UnknownSet(String),
    #[error("character set {0:?} is exhausted")]
    SetExhausted(String),
    #[error("character {1:?} in set {0:?} is already allocated to another set")]
    ReusedChar(String, char),
    #[error("transaction number {given} is not strictly greater than the last committed {last}")]
    NonMonotonic { given: u64, last: u64 },
    #[error("mapping assigns character {0:?} to more than one account in the same snapshot")]
    CharacterCollision(char),
    #[error("snapshot at transaction number {0} has already been consulted and cannot be altered")]
    FrozenModification(u64),
    #[error("no mapping exists for account {account:?} at or before transaction number {k}")]
    IncompletePath { account: String, k: u64 },
    #[error("character-set auto-allocation was requested but no manager is configured")]
    NoCharacterSetManager,
}
