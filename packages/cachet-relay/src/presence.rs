//! Presence registry.
//!
//! Source of truth for who is reachable. Maps identity → live
//! connection in a concurrent `DashMap`; per-connection tasks
//! communicate only through this registry and each other's outbound
//! channels. Presence broadcasts are fire-and-forget — a connection
//! closing concurrently with a broadcast may miss the event, which is
//! an accepted race.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::ServerEnvelope;

/// A connected client's outbound channel.
pub type OutboundSender = mpsc::UnboundedSender<ServerEnvelope>;

/// One identity's live connection.
#[derive(Debug, Clone)]
pub struct PresenceEntry {
    /// Distinguishes this connection from a superseding one under the
    /// same identity.
    pub connection_id: Uuid,
    /// Handle for writing to the connection's outbound channel.
    pub sender: OutboundSender,
    /// When the entry was registered.
    pub since: DateTime<Utc>,
}

/// Identity → live connection. At most one entry per identity is
/// authoritative for routing.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    online: DashMap<String, PresenceEntry>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under `identity`.
    ///
    /// Last-writer-wins: an existing entry is replaced and returned as
    /// superseded, not closed. A fresh registration broadcasts
    /// `friend:online` to every other connection; a replacement does
    /// not, since the identity never went offline from their view.
    pub fn register(
        &self,
        identity: &str,
        connection_id: Uuid,
        sender: OutboundSender,
    ) -> Option<PresenceEntry> {
        let entry = PresenceEntry {
            connection_id,
            sender,
            since: Utc::now(),
        };
        let superseded = self.online.insert(identity.to_string(), entry);

        if superseded.is_some() {
            tracing::info!(identity, "connection superseded by new registration");
        } else {
            tracing::info!(identity, "client registered");
            self.broadcast_except(
                identity,
                ServerEnvelope::FriendOnline {
                    identity: identity.to_string(),
                },
            );
        }
        superseded
    }

    /// Remove `identity`'s entry, but only if it still belongs to
    /// `connection_id` — a superseded connection's late cleanup must
    /// not evict its replacement. Broadcasts `friend:offline` when an
    /// entry was actually removed. Idempotent.
    pub fn deregister(&self, identity: &str, connection_id: Uuid) -> bool {
        let removed = self
            .online
            .remove_if(identity, |_, entry| entry.connection_id == connection_id)
            .is_some();
        if removed {
            tracing::info!(identity, "client deregistered");
            self.broadcast_except(
                identity,
                ServerEnvelope::FriendOffline {
                    identity: identity.to_string(),
                },
            );
        }
        removed
    }

    /// All currently online identities, for the initial presence query.
    pub fn snapshot(&self) -> Vec<String> {
        self.online.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Write an envelope to an identity's outbound channel. Returns
    /// false if the identity is offline or its channel already closed.
    pub fn send_to(&self, identity: &str, envelope: ServerEnvelope) -> bool {
        match self.online.get(identity) {
            Some(entry) => entry.sender.send(envelope).is_ok(),
            None => false,
        }
    }

    /// Whether `identity` currently holds an active connection.
    pub fn is_online(&self, identity: &str) -> bool {
        self.online.contains_key(identity)
    }

    /// Number of active connections.
    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    /// Fire-and-forget broadcast to every connection except `identity`.
    /// Send failures (peers mid-close) are ignored.
    fn broadcast_except(&self, identity: &str, envelope: ServerEnvelope) {
        for entry in self.online.iter() {
            if entry.key() != identity {
                let _ = entry.value().sender.send(envelope.clone());
            }
        }
    }
}
