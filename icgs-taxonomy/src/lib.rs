//! Character-set allocation and the historized, time-indexed account
//! taxonomy that turns DAG paths into words for NFA classification.

mod character_set;
mod endpoint;
mod error;
mod taxonomy;

pub use character_set::CharacterSetManager;
pub use endpoint::{Endpoint, Side};
pub use error::TaxonomyError;
pub use taxonomy::{TaxonomyHistory, TaxonomySnapshot};
