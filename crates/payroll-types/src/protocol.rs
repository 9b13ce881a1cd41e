//! JSON wire protocol between the sync server and its clients.
//!
//! All frames are JSON text messages tagged by a `type` member. The
//! server pushes [`ServerMessage`] frames; clients send `state:update`
//! frames which are extracted with [`parse_client_frame`] and then
//! shape-validated by [`validate_candidate`](crate::validate_candidate).
//!
//! No error frame exists: malformed client input is silently dropped
//! and failures are operator-visible via logs only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::PayrollState;

/// Frame tag for client update messages.
pub const STATE_UPDATE: &str = "state:update";

/// Identifier for one live client connection.
///
/// Minted when the connection is established; carries no identity
/// beyond the connection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Mint a fresh connection identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Messages pushed from the server to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Initial snapshot, sent once to a newly connected client.
    #[serde(rename = "state:snapshot")]
    Snapshot {
        /// Identifier assigned to the receiving connection.
        #[serde(rename = "clientId")]
        client_id: ClientId,
        /// The current authoritative state.
        state: PayrollState,
    },

    /// Presence count, broadcast to every connection on each connect
    /// and disconnect.
    #[serde(rename = "presence:update")]
    Presence {
        /// Number of currently open connections.
        count: usize,
    },

    /// Broadcast to every connection, including the originator, after
    /// an accepted update has been applied and persistence attempted.
    #[serde(rename = "state:updated")]
    Updated {
        /// The new authoritative state.
        state: PayrollState,
        /// The connection that originated the update.
        #[serde(rename = "sourceClientId")]
        source_client_id: ClientId,
    },
}

/// Extract the candidate payload from a raw client frame.
///
/// Returns the frame as a JSON value only when it is an object tagged
/// `"type": "state:update"`; anything else (non-JSON text, missing or
/// unknown tag) yields `None` and is ignored by the caller. The
/// returned payload still has to pass shape validation before it can
/// replace the authoritative state.
pub fn parse_client_frame(text: &str) -> Option<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    match value.get("type").and_then(serde_json::Value::as_str) {
        Some(STATE_UPDATE) => Some(value),
        _ => None,
    }
}
