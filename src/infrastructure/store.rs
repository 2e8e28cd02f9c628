//! Persistence collaborator for the generator
//!
//! The generator only ever reads: it asks for the highest stored value that
//! starts with `prefix + partition`. Writing the owning entity, and the
//! uniqueness constraint that makes the whole scheme correct, belong to the
//! caller's write path, which reports its outcome as a [`PersistError`].

use crate::domain::identifiers::GeneratedIdentifier;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Error type for identifier store reads
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of the caller's attempt to persist an entity under a new code
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The uniqueness constraint rejected the code: another writer won the race
    #[error("Identifier {identifier} already exists")]
    Conflict { identifier: String },

    #[error("Persistence failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PersistError {
    pub fn conflict(identifier: impl ToString) -> Self {
        Self::Conflict {
            identifier: identifier.to_string(),
        }
    }

    pub fn failed(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(err.into())
    }

    /// Classifies a Postgres write error; unique violations become conflicts
    pub fn from_sqlx(identifier: impl ToString, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::conflict(identifier)
            }
            _ => Self::Failed(Box::new(err)),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Read side of the store holding issued codes
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    /// Highest stored value starting with `prefix_pattern`, ranked by [`rank`]
    async fn find_highest_matching(&self, prefix_pattern: &str)
        -> Result<Option<String>, StoreError>;
}

#[async_trait]
impl<T: IdentifierStore + ?Sized> IdentifierStore for Arc<T> {
    async fn find_highest_matching(
        &self,
        prefix_pattern: &str,
    ) -> Result<Option<String>, StoreError> {
        (**self).find_highest_matching(prefix_pattern).await
    }
}

/// Ordering key every store uses to pick the "highest" value
///
/// Values whose remainder after the pattern is not all ASCII digits rank
/// above every well-formed value, so bad data is reported instead of being
/// skipped. Then longer values win, so sequences that outgrew the width keep
/// counting. Ties are broken byte-wise.
pub fn rank<'a>(prefix_pattern: &str, value: &'a str) -> (bool, usize, &'a str) {
    let remainder = value.get(prefix_pattern.len()..).unwrap_or_default();
    let conforming = !remainder.is_empty() && remainder.bytes().all(|b| b.is_ascii_digit());
    (!conforming, value.len(), value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Live,
    Deleted,
}

/// In-process store with a uniqueness constraint
///
/// Deleting a code leaves a tombstone so the code stays reserved and is never
/// issued again.
#[derive(Debug, Default)]
pub struct InMemoryIdentifierStore {
    entries: Mutex<BTreeMap<String, EntryState>>,
}

impl InMemoryIdentifierStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a code, failing with a conflict if it was ever stored before
    pub async fn insert(&self, identifier: &GeneratedIdentifier) -> Result<(), PersistError> {
        self.insert_raw(identifier.to_string()).await
    }

    /// Inserts any value, including ones that are not in canonical form
    pub async fn insert_raw(&self, value: impl Into<String>) -> Result<(), PersistError> {
        let value = value.into();
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&value) {
            return Err(PersistError::Conflict { identifier: value });
        }
        entries.insert(value, EntryState::Live);
        Ok(())
    }

    /// Marks a code deleted; returns whether it was live
    pub async fn delete(&self, value: &str) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(value) {
            Some(state) if *state == EntryState::Live => {
                *state = EntryState::Deleted;
                true
            }
            _ => false,
        }
    }

    pub async fn contains(&self, value: &str) -> bool {
        self.entries.lock().await.get(value) == Some(&EntryState::Live)
    }

    pub async fn live_codes(&self) -> Vec<String> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|(_, state)| **state == EntryState::Live)
            .map(|(value, _)| value.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.live_codes().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IdentifierStore for InMemoryIdentifierStore {
    #[instrument(skip(self))]
    async fn find_highest_matching(
        &self,
        prefix_pattern: &str,
    ) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().await;
        let highest = entries
            .range(prefix_pattern.to_string()..)
            .map(|(value, _)| value)
            .take_while(|value| value.starts_with(prefix_pattern))
            .max_by(|a, b| rank(prefix_pattern, a).cmp(&rank(prefix_pattern, b)))
            .cloned();
        debug!(highest = ?highest, "Scanned in-memory identifier store");
        Ok(highest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn empty_store_has_no_match() {
        let store = InMemoryIdentifierStore::new();
        assert_eq!(store.find_highest_matching("PPAY2025").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn highest_ignores_other_partitions_and_prefixes() {
        let store = InMemoryIdentifierStore::new();
        for value in [
            "PPAY2024000900",
            "PPAY2025000002",
            "PPAY2025000010",
            "PPAYX2025000999",
            "PSAL2025000500",
        ] {
            store.insert_raw(value).await.unwrap();
        }

        assert_eq!(
            store.find_highest_matching("PPAY2025").await.unwrap(),
            Some("PPAY2025000010".to_string())
        );
    }

    #[tokio::test]
    async fn longer_sequences_rank_higher() {
        let store = InMemoryIdentifierStore::new();
        store.insert_raw("PPAY2025999999").await.unwrap();
        store.insert_raw("PPAY20251000000").await.unwrap();

        assert_eq!(
            store.find_highest_matching("PPAY2025").await.unwrap(),
            Some("PPAY20251000000".to_string())
        );
    }

    #[rstest]
    #[case::letters("PPAY2025XXXXXX")]
    #[case::shorter_garbage("PPAY2025X")]
    #[case::bare_pattern("PPAY2025")]
    #[tokio::test]
    async fn malformed_values_rank_above_well_formed(#[case] malformed: &str) {
        let store = InMemoryIdentifierStore::new();
        store.insert_raw("PPAY2025000001").await.unwrap();
        store.insert_raw("PPAY20251000000").await.unwrap();
        store.insert_raw(malformed).await.unwrap();

        assert_eq!(
            store.find_highest_matching("PPAY2025").await.unwrap(),
            Some(malformed.to_string())
        );
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = InMemoryIdentifierStore::new();
        store.insert_raw("PPAY2025000001").await.unwrap();

        let err = store.insert_raw("PPAY2025000001").await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn deleted_codes_stay_reserved() {
        let store = InMemoryIdentifierStore::new();
        store.insert_raw("PPAY2025000001").await.unwrap();
        store.insert_raw("PPAY2025000002").await.unwrap();

        assert!(store.delete("PPAY2025000002").await);
        assert!(!store.delete("PPAY2025000002").await);
        assert!(!store.contains("PPAY2025000002").await);

        assert_eq!(
            store.find_highest_matching("PPAY2025").await.unwrap(),
            Some("PPAY2025000002".to_string())
        );
        assert!(store.insert_raw("PPAY2025000002").await.unwrap_err().is_conflict());
        assert_eq!(store.live_codes().await, vec!["PPAY2025000001".to_string()]);
    }

    #[test]
    fn rank_orders_malformed_then_length_then_bytes() {
        let pattern = "PPAY2025";
        assert!(rank(pattern, "PPAY2025A") > rank(pattern, "PPAY20259999999"));
        assert!(rank(pattern, "PPAY20251000000") > rank(pattern, "PPAY2025999999"));
        assert!(rank(pattern, "PPAY2025000002") > rank(pattern, "PPAY2025000001"));
    }

    #[test]
    fn non_conflict_persist_errors_are_failures() {
        let err = PersistError::from_sqlx("PPAY2025000001", sqlx::Error::RowNotFound);
        assert!(!err.is_conflict());
        assert!(matches!(err, PersistError::Failed(_)));
    }
}
