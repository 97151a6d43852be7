//! Error types for the Cachet client core.
//!
//! Precondition violations (`InvalidKeyFormat`, `PlaintextTooLarge`) are
//! surfaced synchronously to the caller and never cross the wire.
//! `DecryptionError` is deliberately opaque: wrong key, corrupted
//! ciphertext and tag mismatch are one failure mode, recovered by the
//! caller with a placeholder rather than a crash.

use thiserror::Error;

/// Result type alias for Cachet core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the client core.
#[derive(Error, Debug)]
pub enum Error {
    // ── Crypto ────────────────────────────────────────────────────────────

    /// A public key string was empty, lacked PEM delimiters, or failed
    /// DER decoding.
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Plaintext exceeds the RSA-OAEP bound for the modulus/hash pair.
    /// File content must go through the hybrid cipher instead.
    #[error("plaintext of {len} bytes exceeds the {max}-byte OAEP bound")]
    PlaintextTooLarge { len: usize, max: usize },

    /// Keypair generation failed. Only reachable when the system entropy
    /// source is broken, which is fatal for the client.
    #[error("keypair generation failed: {0}")]
    KeyGeneration(String),

    /// A key could not be re-encoded as PEM. Not expected in normal
    /// operation.
    #[error("key encoding error: {0}")]
    KeyEncoding(String),

    /// Encryption failed below the size bound. Not expected in normal
    /// operation.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Wrong key, corrupted ciphertext, or authentication-tag mismatch.
    #[error("decryption failed")]
    DecryptionError,

    // ── Directory ─────────────────────────────────────────────────────────

    /// The recipient has no published public key; the send aborts before
    /// any network write.
    #[error("no published public key for '{0}'")]
    KeyNotFound(String),

    /// The directory rejected the bearer token on upload.
    #[error("directory rejected the upload token")]
    Unauthorized,

    /// Transport-level failure talking to the directory.
    #[error("directory request failed: {0}")]
    Directory(#[from] reqwest::Error),

    // ── Relay connection ──────────────────────────────────────────────────

    /// WebSocket transport failure. Not retried here; retry policy
    /// belongs to the calling layer.
    #[error("relay transport error: {0}")]
    Transport(String),

    /// The relay sent a frame that is not part of the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    // ── Ambient ───────────────────────────────────────────────────────────

    /// Local vault storage failure.
    #[error("vault storage error: {0}")]
    Vault(#[from] std::io::Error),

    /// JSON encoding/decoding failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_too_large_names_both_bounds() {
        let err = Error::PlaintextTooLarge { len: 191, max: 190 };
        let msg = err.to_string();
        assert!(msg.contains("191"));
        assert!(msg.contains("190"));
    }

    #[test]
    fn decryption_error_is_opaque() {
        assert_eq!(Error::DecryptionError.to_string(), "decryption failed");
    }

    #[test]
    fn key_not_found_names_identity() {
        let err = Error::KeyNotFound("bob".into());
        assert!(err.to_string().contains("bob"));
    }
}
