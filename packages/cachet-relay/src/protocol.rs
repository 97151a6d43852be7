//! Relay protocol envelope definitions.
//!
//! The relay speaks JSON-over-WebSocket: every frame is an object with
//! a `type` discriminator and a `payload` object. Envelopes are closed
//! tagged variants — unknown tags fail deserialization at the
//! connection boundary and are answered with a typed `error` frame.
//!
//! All ciphertext fields are opaque to the relay; E2E encryption
//! happens client-side.

use serde::{Deserialize, Serialize};

// ── Client → Relay ────────────────────────────────────────────────────────────

/// Envelopes sent from a client to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientEnvelope {
    /// An encrypted text message for another identity.
    #[serde(rename = "message:send", rename_all = "camelCase")]
    MessageSend { to: String, encrypted_content: String },

    /// An encrypted file (hybrid-sealed) for another identity.
    #[serde(rename = "file:send", rename_all = "camelCase")]
    FileSend {
        to: String,
        file_name: String,
        file_type: String,
        encrypted_file: String,
        encrypted_key: String,
    },
}

// ── Relay → Client ────────────────────────────────────────────────────────────

/// Envelopes sent from the relay to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerEnvelope {
    /// An encrypted message forwarded verbatim from another identity.
    #[serde(rename = "message:receive", rename_all = "camelCase")]
    MessageReceive {
        from: String,
        encrypted_content: String,
    },

    /// An encrypted file forwarded verbatim from another identity.
    #[serde(rename = "file:receive", rename_all = "camelCase")]
    FileReceive {
        from: String,
        file_name: String,
        file_type: String,
        encrypted_file: String,
        encrypted_key: String,
    },

    /// All currently online identities, sent once on becoming active.
    #[serde(rename = "friends:online_list")]
    FriendsOnlineList(Vec<OnlineFriend>),

    /// An identity came online.
    #[serde(rename = "friend:online")]
    FriendOnline { identity: String },

    /// An identity went offline.
    #[serde(rename = "friend:offline")]
    FriendOffline { identity: String },

    /// Typed protocol error (malformed or unknown envelope).
    #[serde(rename = "error")]
    Error { message: String },
}

/// One entry of the presence snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineFriend {
    pub identity: String,
}
