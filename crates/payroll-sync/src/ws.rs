//! `WebSocket` handler implementing the sync protocol.
//!
//! Clients connect to `GET /ws`. The handler mints a [`ClientId`],
//! sends that connection a `state:snapshot` frame, registers it in the
//! connection set, and broadcasts the new presence count to everyone
//! (including the new client). Inbound `state:update` frames are
//! validated and applied through the shared state's single mutation
//! point; anything malformed is dropped without a reply. On disconnect
//! the decremented presence count is broadcast.
//!
//! If a client falls behind the broadcast channel, lagged messages are
//! silently skipped and the client resumes from the most recent frame.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use payroll_types::{ClientId, ServerMessage, parse_client_frame};
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and run the
/// sync protocol for its lifetime.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_sync(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_sync(socket, state))
}

/// Handle one connection's lifecycle: snapshot, presence, update loop,
/// departure.
async fn handle_sync(mut socket: WebSocket, state: Arc<AppState>) {
    let client_id = ClientId::new();
    debug!(client_id = %client_id, "Client connected");

    // Subscribe before taking the snapshot so no update broadcast can
    // fall between the two.
    let mut rx = state.subscribe();

    let snapshot = ServerMessage::Snapshot {
        client_id: client_id.clone(),
        state: state.snapshot().await,
    };
    if send_message(&mut socket, &snapshot).await.is_err() {
        debug!(client_id = %client_id, "Client disconnected before snapshot");
        return;
    }

    // Registration broadcasts the new presence count atomically with
    // the membership change.
    state.register(client_id.clone()).await;

    loop {
        tokio::select! {
            // Fan-out from the broadcast channel to this socket.
            result = rx.recv() => {
                match result {
                    Ok(message) => {
                        if send_message(&mut socket, &message).await.is_err() {
                            debug!(client_id = %client_id, "Client disconnected (send failed)");
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(client_id = %client_id, skipped = n, "Client lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down connection");
                        break;
                    }
                }
            }
            // Inbound frames from the client.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(candidate) = parse_client_frame(&text) {
                            // Rejected updates produce no reply; accepted
                            // ones broadcast from inside the call.
                            let _ = state.apply_and_broadcast(&client_id, &candidate).await;
                        } else {
                            debug!(client_id = %client_id, "Ignoring unrecognized frame");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(client_id = %client_id, "Client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(client_id = %client_id, "Client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(client_id = %client_id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Ignore binary and pong frames.
                    }
                }
            }
        }
    }

    state.deregister(&client_id).await;
}

/// Serialize and send one frame. Serialization failures are logged and
/// swallowed; only transport errors surface so the caller drops the
/// connection.
async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(message) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!("Failed to serialize outbound message: {e}");
            Ok(())
        }
    }
}
