//! Shared application state for the sync server.
//!
//! [`AppState`] holds the broadcast channel used to fan messages out to
//! every connected client, the shared [`StateStore`], the mutation lock
//! serializing accepted updates, and the [`ConnectionSet`] tracking
//! live connections for presence counts.
//!
//! Two locks with distinct jobs:
//!
//! - the **mutation lock** serializes replace, persist, and the
//!   `state:updated` broadcast of each accepted update. Snapshots never
//!   take it, so a hung persistence call stalls only that update's
//!   broadcast, never new-connection intake.
//! - the **membership lock** inside [`ConnectionSet`] is held across
//!   the count computation and the `presence:update` broadcast, so
//!   presence frames leave in the order the counts were computed.

use std::collections::HashSet;
use std::sync::Arc;

use payroll_store::{StateStore, StorageKind, UpdateOutcome};
use payroll_types::{ClientId, PayrollState, ServerMessage};
use tokio::sync::{Mutex, RwLock, broadcast};

/// Capacity of the broadcast channel for outbound messages.
///
/// If a subscriber falls behind by more than this many messages it
/// will receive a [`broadcast::error::RecvError::Lagged`] and skip to
/// the newest message.
const BROADCAST_CAPACITY: usize = 256;

/// The set of currently open client connections.
///
/// Membership changes on connect and disconnect; connections carry no
/// persisted identity beyond their lifetime. Changes go through
/// [`AppState::register`] and [`AppState::deregister`] so the presence
/// broadcast stays ordered with the membership change.
#[derive(Debug, Default)]
pub struct ConnectionSet {
    inner: RwLock<HashSet<ClientId>>,
}

impl ConnectionSet {
    /// Current presence count.
    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender fanning messages out to every connection.
    tx: broadcast::Sender<ServerMessage>,
    /// The authoritative state and its storage backend.
    store: Arc<StateStore>,
    /// Serializes replace, persist, and broadcast of accepted updates.
    mutation: Arc<Mutex<()>>,
    /// Live connection membership.
    connections: Arc<ConnectionSet>,
    /// Identity of the active storage backend, fixed at startup.
    kind: StorageKind,
}

impl AppState {
    /// Build the application state around an initialized store.
    pub fn new(store: StateStore) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let kind = store.kind();
        Self {
            tx,
            store: Arc::new(store),
            mutation: Arc::new(Mutex::new(())),
            connections: Arc::new(ConnectionSet::default()),
            kind,
        }
    }

    /// Subscribe to the outbound broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.tx.subscribe()
    }

    /// Fan a message out to every connected client.
    ///
    /// Returns the number of receivers. Zero receivers is normal when
    /// no clients are connected, not an error.
    pub fn broadcast(&self, message: ServerMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    /// Read-only copy of the current authoritative state.
    ///
    /// Reads the store directly, never taking the mutation lock: an
    /// update whose persistence call hangs cannot block a new
    /// connection's snapshot.
    pub async fn snapshot(&self) -> PayrollState {
        self.store.snapshot().await
    }

    /// Identity of the active storage backend.
    pub const fn storage_kind(&self) -> StorageKind {
        self.kind
    }

    /// The live connection set.
    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    /// Register a connection and broadcast the new presence count to
    /// every client, returning it.
    ///
    /// The membership write lock is held across the count computation
    /// and the broadcast send (which is non-blocking), so concurrent
    /// membership changes broadcast their counts in a single total
    /// order.
    pub async fn register(&self, id: ClientId) -> usize {
        let mut members = self.connections.inner.write().await;
        members.insert(id);
        let count = members.len();
        self.broadcast(ServerMessage::Presence { count });
        count
    }

    /// Deregister a connection and broadcast the new presence count to
    /// every remaining client, returning it.
    pub async fn deregister(&self, id: &ClientId) -> usize {
        let mut members = self.connections.inner.write().await;
        members.remove(id);
        let count = members.len();
        self.broadcast(ServerMessage::Presence { count });
        count
    }

    /// Validate and apply a candidate update, broadcasting the new
    /// state to every connection (including the originator) when it is
    /// accepted.
    ///
    /// The mutation lock is held across replace, persist, and
    /// broadcast: persistence calls complete in the same order as their
    /// in-memory replacements, and every client observes
    /// `state:updated` frames in application order.
    pub async fn apply_and_broadcast(
        &self,
        source: &ClientId,
        candidate: &serde_json::Value,
    ) -> UpdateOutcome {
        let _serialized = self.mutation.lock().await;
        let outcome = self.store.apply_update(candidate).await;
        if let UpdateOutcome::Applied { state, .. } = &outcome {
            self.broadcast(ServerMessage::Updated {
                state: state.clone(),
                source_client_id: source.clone(),
            });
        }
        outcome
    }
}
