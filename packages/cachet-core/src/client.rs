//! # Relay Client
//!
//! WebSocket client for a Cachet relay. Encrypts outbound envelopes
//! before anything touches the socket, decrypts inbound ones locally,
//! and surfaces everything as a stream of [`ClientEvent`]s.
//!
//! All payloads on the wire are opaque encrypted blobs — the relay
//! never sees plaintext.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::crypto::{asymmetric, hybrid};
use crate::directory::DirectoryClient;
use crate::error::{Error, Result};
use crate::vault::KeyVault;

/// Shown in place of a message body that would not decrypt. The
/// conversation continues; one unreadable message is not fatal.
pub const UNDECRYPTABLE_PLACEHOLDER: &str = "[unable to decrypt message]";

// ── Wire Envelopes ────────────────────────────────────────────────────────────

/// Envelopes sent from client to relay.
/// Must match the relay server's `ClientEnvelope` enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[allow(missing_docs)]
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

/// Envelopes received from the relay.
/// Must match the relay server's `ServerEnvelope` enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[allow(missing_docs)]
pub enum ServerEnvelope {
    /// An encrypted message forwarded verbatim from another identity.
    #[serde(rename = "message:receive", rename_all = "camelCase")]
    MessageReceive {
        from: String,
        encrypted_content: String,
    },

    #[serde(rename = "file:receive", rename_all = "camelCase")]
    FileReceive {
        from: String,
        file_name: String,
        file_type: String,
        encrypted_file: String,
        encrypted_key: String,
    },

    #[serde(rename = "friends:online_list")]
    FriendsOnlineList(Vec<OnlineFriend>),

    #[serde(rename = "friend:online")]
    FriendOnline { identity: String },

    #[serde(rename = "friend:offline")]
    FriendOffline { identity: String },

    #[serde(rename = "error")]
    Error { message: String },
}

/// One entry of the `friends:online_list` greeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineFriend {
    /// The online identity.
    pub identity: String,
}

// ── Client Events ─────────────────────────────────────────────────────────────

/// Decrypted, application-facing events from the relay connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A text message, already decrypted. Carries
    /// [`UNDECRYPTABLE_PLACEHOLDER`] when the ciphertext would not open.
    MessageReceived { from: String, text: String },

    /// A file transfer. `contents` is `None` when the sealed data would
    /// not decrypt.
    FileReceived {
        from: String,
        file_name: String,
        file_type: String,
        contents: Option<Vec<u8>>,
    },

    /// The presence snapshot sent once on becoming active.
    FriendsOnline(Vec<String>),

    /// A peer came online.
    FriendOnline(String),

    /// A peer went offline.
    FriendOffline(String),

    /// A typed error frame from the relay.
    RelayError(String),

    /// The relay sent a frame outside the protocol.
    ProtocolError(String),

    /// The connection ended (close frame, transport failure, or
    /// [`RelayClient::close`]). Terminal.
    Disconnected,
}

// ── Relay Client ──────────────────────────────────────────────────────────────

/// Handle to an active relay connection.
///
/// Dropping the handle (or calling [`RelayClient::close`]) closes the
/// connection and ends the event stream.
pub struct RelayClient {
    outbound: mpsc::UnboundedSender<ClientEnvelope>,
    vault: Arc<KeyVault>,
    directory: Arc<DirectoryClient>,
}

impl RelayClient {
    /// Connect to `relay_url` (e.g. `ws://host:8080`), authenticating
    /// with the bearer token in the `?token=` query.
    ///
    /// Returns the client handle and the inbound event stream.
    pub async fn connect(
        relay_url: &str,
        token: &str,
        vault: Arc<KeyVault>,
        directory: Arc<DirectoryClient>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ClientEvent>)> {
        let url = format!(
            "{}/ws?token={}",
            relay_url.trim_end_matches('/'),
            urlencoding::encode(token)
        );
        let (socket, _response) = connect_async(&url)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let (mut write, mut read) = socket.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientEnvelope>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ClientEvent>();

        // Writer: drain the outbound queue, then say goodbye.
        tokio::spawn(async move {
            while let Some(envelope) = out_rx.recv().await {
                match serde_json::to_string(&envelope) {
                    Ok(json) => {
                        if write.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize outbound envelope");
                    }
                }
            }
            let _ = write.send(Message::Close(None)).await;
        });

        // Reader: decode, decrypt locally, forward as events.
        let reader_vault = Arc::clone(&vault);
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let event = match serde_json::from_str::<ServerEnvelope>(&text) {
                            Ok(envelope) => translate(envelope, &reader_vault),
                            Err(e) => ClientEvent::ProtocolError(format!(
                                "unparseable relay frame: {e}"
                            )),
                        };
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "relay stream error");
                        break;
                    }
                }
            }
            let _ = event_tx.send(ClientEvent::Disconnected);
        });

        Ok((
            Self {
                outbound: out_tx,
                vault,
                directory,
            },
            event_rx,
        ))
    }

    /// Encrypt `text` for `to` and hand the envelope to the relay.
    ///
    /// Resolves the recipient's key from the session cache or the
    /// directory; [`Error::KeyNotFound`] aborts before any network
    /// write to the relay. Text longer than the OAEP bound is rejected
    /// synchronously with [`Error::PlaintextTooLarge`].
    pub async fn send_message(&self, to: &str, text: &str) -> Result<()> {
        let recipient_key = self.directory.lookup(to).await?;
        let encrypted_content = asymmetric::encrypt(text.as_bytes(), &recipient_key)?;
        self.send_envelope(ClientEnvelope::MessageSend {
            to: to.to_string(),
            encrypted_content,
        })
    }

    /// Hybrid-seal `contents` for `to` and hand the envelope to the relay.
    pub async fn send_file(
        &self,
        to: &str,
        file_name: &str,
        file_type: &str,
        contents: &[u8],
    ) -> Result<()> {
        let recipient_key = self.directory.lookup(to).await?;
        let (sealed_file, sealed_key) = hybrid::encrypt_file(contents, &recipient_key)?;
        self.send_envelope(ClientEnvelope::FileSend {
            to: to.to_string(),
            file_name: file_name.to_string(),
            file_type: file_type.to_string(),
            encrypted_file: BASE64.encode(sealed_file),
            encrypted_key: sealed_key,
        })
    }

    /// This client's own public key, e.g. for display or verification.
    pub fn public_key_pem(&self) -> Result<String> {
        self.vault.public_key_pem()
    }

    /// Close the connection. The event stream ends with
    /// [`ClientEvent::Disconnected`].
    pub fn close(self) {
        drop(self.outbound);
    }

    fn send_envelope(&self, envelope: ClientEnvelope) -> Result<()> {
        self.outbound
            .send(envelope)
            .map_err(|_| Error::Transport("connection closed".into()))
    }
}

/// Turn a wire envelope into an application event, decrypting locally.
///
/// Decryption failure is recovered here — placeholder text for
/// messages, `None` contents for files — so one bad ciphertext never
/// tears down the stream.
fn translate(envelope: ServerEnvelope, vault: &KeyVault) -> ClientEvent {
    match envelope {
        ServerEnvelope::MessageReceive {
            from,
            encrypted_content,
        } => {
            let text = vault
                .decrypt(&encrypted_content)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .unwrap_or_else(|| {
                    tracing::debug!(from = from.as_str(), "message did not decrypt");
                    UNDECRYPTABLE_PLACEHOLDER.to_string()
                });
            ClientEvent::MessageReceived { from, text }
        }

        ServerEnvelope::FileReceive {
            from,
            file_name,
            file_type,
            encrypted_file,
            encrypted_key,
        } => {
            let contents = BASE64
                .decode(encrypted_file)
                .ok()
                .and_then(|sealed| vault.decrypt_file(&sealed, &encrypted_key).ok());
            if contents.is_none() {
                tracing::debug!(
                    from = from.as_str(),
                    file_name = file_name.as_str(),
                    "file did not decrypt"
                );
            }
            ClientEvent::FileReceived {
                from,
                file_name,
                file_type,
                contents,
            }
        }

        ServerEnvelope::FriendsOnlineList(friends) => {
            ClientEvent::FriendsOnline(friends.into_iter().map(|f| f.identity).collect())
        }
        ServerEnvelope::FriendOnline { identity } => ClientEvent::FriendOnline(identity),
        ServerEnvelope::FriendOffline { identity } => ClientEvent::FriendOffline(identity),
        ServerEnvelope::Error { message } => ClientEvent::RelayError(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::asymmetric::encrypt;

    fn test_vault() -> (tempfile::TempDir, KeyVault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = KeyVault::open(dir.path().join("identity.pem")).unwrap();
        (dir, vault)
    }

    #[test]
    fn message_send_wire_format() {
        let envelope = ClientEnvelope::MessageSend {
            to: "bob".to_string(),
            encrypted_content: "Y2lwaGVy".to_string(),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(
            json,
            r#"{"type":"message:send","payload":{"to":"bob","encryptedContent":"Y2lwaGVy"}}"#
        );
    }

    #[test]
    fn file_send_wire_format() {
        let envelope = ClientEnvelope::FileSend {
            to: "bob".to_string(),
            file_name: "notes.txt".to_string(),
            file_type: "text/plain".to_string(),
            encrypted_file: "c2VhbGVk".to_string(),
            encrypted_key: "a2V5".to_string(),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains(r#""type":"file:send""#));
        assert!(json.contains(r#""fileName":"notes.txt""#));
        assert!(json.contains(r#""fileType":"text/plain""#));
        assert!(json.contains(r#""encryptedFile":"c2VhbGVk""#));
        assert!(json.contains(r#""encryptedKey":"a2V5""#));
    }

    #[test]
    fn server_envelopes_parse() {
        let msg: ServerEnvelope = serde_json::from_str(
            r#"{"type":"message:receive","payload":{"from":"alice","encryptedContent":"YmxvYg=="}}"#,
        )
        .unwrap();
        assert!(matches!(msg, ServerEnvelope::MessageReceive { .. }));

        let list: ServerEnvelope = serde_json::from_str(
            r#"{"type":"friends:online_list","payload":[{"identity":"alice"},{"identity":"bob"}]}"#,
        )
        .unwrap();
        match list {
            ServerEnvelope::FriendsOnlineList(friends) => assert_eq!(friends.len(), 2),
            other => panic!("wrong variant: {other:?}"),
        }

        let online: ServerEnvelope =
            serde_json::from_str(r#"{"type":"friend:online","payload":{"identity":"carol"}}"#)
                .unwrap();
        assert!(matches!(online, ServerEnvelope::FriendOnline { .. }));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result = serde_json::from_str::<ServerEnvelope>(
            r#"{"type":"presence:subscribe","payload":{}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn translate_decrypts_message() {
        let (_dir, vault) = test_vault();
        let encrypted_content = encrypt(b"hi", vault.public_key()).unwrap();
        let event = translate(
            ServerEnvelope::MessageReceive {
                from: "alice".into(),
                encrypted_content,
            },
            &vault,
        );
        assert_eq!(
            event,
            ClientEvent::MessageReceived {
                from: "alice".into(),
                text: "hi".into()
            }
        );
    }

    #[test]
    fn translate_substitutes_placeholder_on_bad_ciphertext() {
        let (_dir, vault) = test_vault();
        let event = translate(
            ServerEnvelope::MessageReceive {
                from: "alice".into(),
                encrypted_content: "bm90IGEgY2lwaGVydGV4dA==".into(),
            },
            &vault,
        );
        assert_eq!(
            event,
            ClientEvent::MessageReceived {
                from: "alice".into(),
                text: UNDECRYPTABLE_PLACEHOLDER.into()
            }
        );
    }

    #[test]
    fn translate_opens_sealed_file() {
        let (_dir, vault) = test_vault();
        let (sealed, sealed_key) =
            hybrid::encrypt_file(b"file body", vault.public_key()).unwrap();
        let event = translate(
            ServerEnvelope::FileReceive {
                from: "alice".into(),
                file_name: "a.bin".into(),
                file_type: "application/octet-stream".into(),
                encrypted_file: BASE64.encode(sealed),
                encrypted_key: sealed_key,
            },
            &vault,
        );
        match event {
            ClientEvent::FileReceived { contents, .. } => {
                assert_eq!(contents.as_deref(), Some(&b"file body"[..]));
            }
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn translate_flags_undecryptable_file() {
        let (_dir, vault) = test_vault();
        let event = translate(
            ServerEnvelope::FileReceive {
                from: "alice".into(),
                file_name: "a.bin".into(),
                file_type: "application/octet-stream".into(),
                encrypted_file: BASE64.encode(b"garbage"),
                encrypted_key: "bm9wZQ==".into(),
            },
            &vault,
        );
        match event {
            ClientEvent::FileReceived { contents, .. } => assert!(contents.is_none()),
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn translate_maps_presence_events() {
        let (_dir, vault) = test_vault();
        let event = translate(
            ServerEnvelope::FriendsOnlineList(vec![
                OnlineFriend {
                    identity: "alice".into(),
                },
                OnlineFriend {
                    identity: "bob".into(),
                },
            ]),
            &vault,
        );
        assert_eq!(
            event,
            ClientEvent::FriendsOnline(vec!["alice".into(), "bob".into()])
        );
    }
}
