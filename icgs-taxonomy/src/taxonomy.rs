use std::collections::{BTreeMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::character_set::CharacterSetManager;
use crate::endpoint::Endpoint;
use crate::error::TaxonomyError;

/// An immutable record binding accounts to characters as of a given
/// transaction number.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaxonomySnapshot {
    pub transaction_number: u64,
    pub mapping: BTreeMap<String, char>,
    pub timestamp_millis: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// An append-only, time-indexed sequence of [`TaxonomySnapshot`]s.
///
/// Snapshots are strictly ordered by `transaction_number`: every `update`
/// must target a transaction number strictly greater than the latest
/// snapshot's. A caller that needs to bind several accounts as of the same
/// transaction number passes them all in one `mappings` map rather than
/// calling `update` once per account.
#[derive(Debug, Default)]
pub struct TaxonomyHistory {
    snapshots: Vec<TaxonomySnapshot>,
    consulted: HashSet<u64>,
}

impl TaxonomyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn last_transaction_number(&self) -> Option<u64> {
        self.snapshots.last().map(|s| s.transaction_number)
    }

    /// Appends a new snapshot at `transaction_number`, seeded from the
    /// latest snapshot's mapping and overlaid with `mappings`.
    ///
    /// `mappings` maps account id to either an explicit character or `None`
    /// to request auto-allocation from `auto_allocate`'s named set. Fails
    /// with [`TaxonomyError::NonMonotonic`] if `transaction_number` is not
    /// strictly greater than the latest snapshot's — including when it is
    /// equal, since `update` never amends an existing snapshot in place.
    pub fn update(
        &mut self,
        mappings: &BTreeMap<String, Option<char>>,
        transaction_number: u64,
        mut auto_allocate: Option<(&mut CharacterSetManager, &str)>,
    ) -> Result<BTreeMap<String, char>, TaxonomyError> {
        if let Some(last) = self.snapshots.last() {
            if transaction_number <= last.transaction_number {
                return Err(TaxonomyError::NonMonotonic {
                    given: transaction_number,
                    last: last.transaction_number,
                });
            }
        }

        let mut resolved: BTreeMap<String, char> = BTreeMap::new();
        for (account, maybe_char) in mappings {
            let c = match maybe_char {
                Some(c) => *c,
                None => {
                    let (manager, set_name) = auto_allocate
                        .as_mut()
                        .ok_or(TaxonomyError::NoCharacterSetManager)?;
                    manager.allocate(set_name)?
                }
            };
            resolved.insert(account.clone(), c);
        }

        let mut merged = self
            .snapshots
            .last()
            .map(|s| s.mapping.clone())
            .unwrap_or_default();
        for (account, c) in &resolved {
            merged.insert(account.clone(), *c);
        }
        check_character_collisions(&merged)?;
        self.snapshots.push(TaxonomySnapshot {
            transaction_number,
            mapping: merged,
            timestamp_millis: now_millis(),
        });

        Ok(resolved)
    }

    /// Reads the mapping of the snapshot at exactly `transaction_number`,
    /// without marking it consulted. Used by a caller that needs to
    /// remember pre-update state for a later [`TaxonomyHistory::rollback`];
    /// unlike [`TaxonomyHistory::character_for`] this never freezes the
    /// snapshot it reads.
    pub fn snapshot_mapping(&self, transaction_number: u64) -> Option<BTreeMap<String, char>> {
        self.snapshots
            .last()
            .filter(|s| s.transaction_number == transaction_number)
            .map(|s| s.mapping.clone())
    }

    /// Reverts a tentative update at `transaction_number`, dropping the
    /// snapshot entirely (every `update` appends a brand-new snapshot; none
    /// ever overwrites an existing one in place, so there is nothing to
    /// restore `to`). `restore` is accepted for symmetry with a caller that
    /// remembers pre-update state but is expected to be `None` in practice.
    /// A no-op if the latest snapshot is not at `transaction_number` —
    /// nothing tentative to undo. Fails if the snapshot was already
    /// consulted by a reader, since that reader may have acted on it.
    pub fn rollback(
        &mut self,
        transaction_number: u64,
        restore: Option<BTreeMap<String, char>>,
    ) -> Result<(), TaxonomyError> {
        let is_latest = self
            .snapshots
            .last()
            .map(|s| s.transaction_number == transaction_number)
            .unwrap_or(false);
        if !is_latest {
            return Ok(());
        }
        if self.consulted.contains(&transaction_number) {
            return Err(TaxonomyError::FrozenModification(transaction_number));
        }
        match restore {
            Some(mapping) => {
                self.snapshots.last_mut().expect("checked above").mapping = mapping;
            }
            None => {
                self.snapshots.pop();
            }
        }
        Ok(())
    }

    fn snapshot_at_or_before_index(&self, k: u64) -> Option<usize> {
        let idx = self
            .snapshots
            .partition_point(|s| s.transaction_number <= k);
        if idx == 0 {
            None
        } else {
            Some(idx - 1)
        }
    }

    /// Returns the character bound to `account` by the greatest snapshot
    /// with `transaction_number <= k`, or `None` if no such snapshot exists
    /// or it does not mention `account`. Marks that snapshot consulted: it
    /// can no longer be amended in place by a later `update` at the same
    /// transaction number.
    pub fn character_for(&mut self, account: &str, k: u64) -> Option<char> {
        let idx = self.snapshot_at_or_before_index(k)?;
        self.consulted.insert(self.snapshots[idx].transaction_number);
        self.snapshots[idx].mapping.get(account).copied()
    }

    /// Concatenates the characters bound to each endpoint's account at `k`
    /// into the path's word, in path order.
    pub fn path_to_word(&mut self, path: &[Endpoint], k: u64) -> Result<String, TaxonomyError> {
        let mut word = String::with_capacity(path.len());
        for endpoint in path {
            let c = self
                .character_for(&endpoint.account_id, k)
                .ok_or_else(|| TaxonomyError::IncompletePath {
                    account: endpoint.account_id.clone(),
                    k,
                })?;
            word.push(c);
        }
        Ok(word)
    }

    /// Non-consulting equivalent of [`TaxonomyHistory::character_for`], for
    /// a caller validating a transaction that might still be rolled back —
    /// reading a tentative snapshot this way never freezes it.
    pub fn peek_character_for(&self, account: &str, k: u64) -> Option<char> {
        let idx = self.snapshot_at_or_before_index(k)?;
        self.snapshots[idx].mapping.get(account).copied()
    }

    /// Non-consulting equivalent of [`TaxonomyHistory::path_to_word`].
    pub fn peek_path_to_word(&self, path: &[Endpoint], k: u64) -> Result<String, TaxonomyError> {
        let mut word = String::with_capacity(path.len());
        for endpoint in path {
            let c = self
                .peek_character_for(&endpoint.account_id, k)
                .ok_or_else(|| TaxonomyError::IncompletePath {
                    account: endpoint.account_id.clone(),
                    k,
                })?;
            word.push(c);
        }
        Ok(word)
    }
}

fn check_character_collisions(mapping: &BTreeMap<String, char>) -> Result<(), TaxonomyError> {
    let mut seen = HashSet::with_capacity(mapping.len());
    for c in mapping.values() {
        if !seen.insert(*c) {
            return Err(TaxonomyError::CharacterCollision(*c));
        }
    }
    Ok(())
}
