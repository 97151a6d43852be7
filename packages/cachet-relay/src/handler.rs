//! WebSocket connection handler.
//!
//! Runs one task per authenticated connection for its whole lifetime:
//! register with the presence registry, greet the client with the
//! online snapshot, pump envelopes both ways, and clean up exactly once
//! on the way out. Authentication happened before the upgrade — a
//! connection that reaches this module is already Active.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::Session;
use crate::presence::PresenceRegistry;
use crate::protocol::{ClientEnvelope, OnlineFriend, ServerEnvelope};
use crate::router::{self, RouteOutcome};

/// Drive a single authenticated WebSocket connection.
pub async fn handle_socket(socket: WebSocket, registry: Arc<PresenceRegistry>, session: Session) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let identity = session.identity;
    let connection_id = Uuid::new_v4();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEnvelope>();

    // ── Active: register, then greet with the presence snapshot ──────────

    registry.register(&identity, connection_id, tx.clone());

    let friends = registry
        .snapshot()
        .into_iter()
        .filter(|online| online != &identity)
        .map(|identity| OnlineFriend { identity })
        .collect();
    let _ = tx.send(ServerEnvelope::FriendsOnlineList(friends));

    // ── Sender task: drain the outbound channel onto the socket ──────────

    let sender_task = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            match serde_json::to_string(&envelope) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        break; // Connection closed
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize outbound envelope");
                }
            }
        }
    });

    // ── Inbound loop: parse, validate, route ─────────────────────────────

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEnvelope>(&text) {
                Ok(envelope) => {
                    if router::route(&registry, &identity, envelope) == RouteOutcome::Invalid {
                        let _ = tx.send(ServerEnvelope::Error {
                            message: "envelope failed validation".to_string(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        identity = identity.as_str(),
                        error = %e,
                        "unparseable client envelope"
                    );
                    let _ = tx.send(ServerEnvelope::Error {
                        message: format!("invalid envelope: {e}"),
                    });
                }
            },
            Ok(Message::Close(_)) => {
                tracing::debug!(identity = identity.as_str(), "client sent close frame");
                break;
            }
            Ok(_) => {} // Ping/Pong handled at the protocol level; Binary has no meaning here
            Err(e) => {
                tracing::warn!(identity = identity.as_str(), error = %e, "websocket error");
                break;
            }
        }
    }

    // ── Closing: guarded deregister, idempotent by connection id ─────────

    registry.deregister(&identity, connection_id);
    sender_task.abort();
    tracing::info!(identity = identity.as_str(), "connection closed");
}
