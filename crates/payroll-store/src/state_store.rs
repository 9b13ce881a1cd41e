//! The authoritative in-memory state and its single mutation point.
//!
//! [`StateStore`] owns the one [`PayrollState`] instance for the
//! process. All mutation funnels through [`StateStore::apply_update`];
//! callers are expected to serialize those calls (the sync server holds
//! a mutation lock around them), which preserves the single-writer
//! invariant and makes persistence calls complete in the same order as
//! their in-memory replacements.
//!
//! The state itself lives behind a read/write lock that is written
//! before the persistence call is issued and is never held across it,
//! so [`StateStore::snapshot`] never waits on an in-flight persistence
//! call. A hung backend stalls only the update that is persisting.

use payroll_types::{PayrollState, Validation, validate_candidate};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::select::{StorageBackend, StorageKind};

/// Outcome of submitting a candidate update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The candidate replaced the authoritative state.
    Applied {
        /// The new authoritative state.
        state: PayrollState,
        /// Whether the persistence attempt succeeded.
        persisted: bool,
    },
    /// The candidate was malformed and discarded without side effects.
    Rejected(&'static str),
}

/// Owns the authoritative [`PayrollState`] and the active storage
/// backend.
#[derive(Debug)]
pub struct StateStore {
    state: RwLock<PayrollState>,
    backend: StorageBackend,
}

impl StateStore {
    /// Open a store around an already-selected backend, loading the
    /// initial state from it.
    pub async fn open(backend: StorageBackend) -> Result<Self, StoreError> {
        let state = backend.load().await?;
        Ok(Self {
            state: RwLock::new(state),
            backend,
        })
    }

    /// Read-only copy of the current state, for newly connected
    /// clients and exporters.
    ///
    /// Waits only for the brief in-memory replacement in
    /// [`Self::apply_update`], never for its persistence call.
    pub async fn snapshot(&self) -> PayrollState {
        self.state.read().await.clone()
    }

    /// Identity of the active storage backend.
    pub const fn kind(&self) -> StorageKind {
        self.backend.kind()
    }

    /// Validate and apply a candidate update.
    ///
    /// Invalid candidates are discarded silently: no state change, no
    /// persistence attempt, nothing surfaced to the submitting client.
    /// Valid candidates replace the in-memory state *before* the
    /// persistence call is issued; a persistence failure is logged and
    /// does not roll the replacement back. The update is accepted
    /// locally even when durability failed, trading durability for
    /// availability.
    ///
    /// Callers must serialize calls to this method; the replacement
    /// order of concurrent unserialized calls is unspecified.
    pub async fn apply_update(&self, candidate: &serde_json::Value) -> UpdateOutcome {
        let state = match validate_candidate(candidate) {
            Validation::Valid(state) => state,
            Validation::Invalid(reason) => {
                tracing::debug!(reason, "Discarding malformed update");
                return UpdateOutcome::Rejected(reason);
            }
        };

        // Replace under the write lock, then release it before the
        // persistence call so readers are never blocked behind it.
        *self.state.write().await = state.clone();

        let persisted = match self.backend.save(&state).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist state update; keeping in-memory value");
                false
            }
        };

        UpdateOutcome::Applied { state, persisted }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::file::FileBackend;

    async fn file_store(dir: &std::path::Path) -> StateStore {
        StateStore::open(StorageBackend::File(FileBackend::new(dir)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn open_loads_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend
            .save(&PayrollState {
                weeks: vec![json!({"id": 1})],
            })
            .await
            .unwrap();

        let store = file_store(dir.path()).await;
        assert_eq!(store.snapshot().await.weeks, vec![json!({"id": 1})]);
        assert_eq!(store.kind(), StorageKind::File);
    }

    #[tokio::test]
    async fn valid_update_replaces_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(dir.path()).await;

        let outcome = store
            .apply_update(&json!({"type": "state:update", "weeks": [{"id": 1}]}))
            .await;
        assert_eq!(
            outcome,
            UpdateOutcome::Applied {
                state: PayrollState {
                    weeks: vec![json!({"id": 1})],
                },
                persisted: true,
            }
        );
        assert_eq!(store.snapshot().await.weeks, vec![json!({"id": 1})]);

        // The new value survives a reload from the same backend.
        let reopened = file_store(dir.path()).await;
        assert_eq!(reopened.snapshot().await.weeks, vec![json!({"id": 1})]);
    }

    #[tokio::test]
    async fn invalid_update_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(dir.path()).await;
        store.apply_update(&json!({"weeks": [json!(1)]})).await;
        let before = store.snapshot().await;

        for candidate in [
            json!({"weeks": 5}),
            json!({"weeks": "nope"}),
            json!({}),
            json!(null),
            json!([1, 2, 3]),
        ] {
            assert!(matches!(
                store.apply_update(&candidate).await,
                UpdateOutcome::Rejected(_)
            ));
            assert_eq!(store.snapshot().await, before);
        }
    }

    #[tokio::test]
    async fn persistence_failure_keeps_in_memory_value() {
        let dir = tempfile::tempdir().unwrap();
        // Point the backend's data directory at a plain file so every
        // save fails with an I/O error.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "x").unwrap();
        let backend = StorageBackend::File(FileBackend::new(&blocked));

        let store = StateStore {
            state: RwLock::new(PayrollState::empty()),
            backend,
        };

        let outcome = store.apply_update(&json!({"weeks": [{"id": 9}]})).await;
        assert_eq!(
            outcome,
            UpdateOutcome::Applied {
                state: PayrollState {
                    weeks: vec![json!({"id": 9})],
                },
                persisted: false,
            }
        );
        // Availability over durability: the update is accepted locally.
        assert_eq!(store.snapshot().await.weeks, vec![json!({"id": 9})]);
    }

    #[tokio::test]
    async fn snapshot_works_concurrently_with_readers() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(dir.path()).await;

        // Snapshots only take the read lock, so holding one read guard
        // must not block another snapshot.
        let guard = store.state.read().await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot, *guard);
    }
}
