//! Bearer-token authentication.
//!
//! Tokens are minted by the login service (out of scope here) and only
//! verified by the relay: `identity.expiry.hex(hmac-sha256(secret,
//! "identity.expiry"))`. Verification yields a [`Session`] that stays
//! immutable for the connection's lifetime — expiry is checked at the
//! handshake, not re-checked mid-connection.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// An authenticated connection's identity, derived once at handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: String,
    pub expires_at: i64,
}

/// Why a token was rejected. Every variant maps to HTTP 401 before the
/// WebSocket upgrade; a rejected connection never touches the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Not three dot-separated parts, non-numeric expiry, non-hex
    /// signature, or a control character in the identity.
    Malformed,
    /// HMAC did not verify under the relay secret.
    BadSignature,
    /// The token's expiry is in the past.
    Expired,
    /// Structurally valid token carrying an empty identity.
    EmptyIdentity,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed bearer token"),
            Self::BadSignature => write!(f, "bad token signature"),
            Self::Expired => write!(f, "token expired"),
            Self::EmptyIdentity => write!(f, "token carries an empty identity"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Mint a bearer token for `identity` valid until `expires_at`
/// (unix seconds). For the login service and tests.
pub fn mint_token(identity: &str, expires_at: i64, secret: &[u8]) -> String {
    let signed = format!("{identity}.{expires_at}");
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(signed.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("{signed}.{signature}")
}

/// Verify a bearer token against the relay secret at time `now`
/// (unix seconds).
pub fn verify_token(token: &str, secret: &[u8], now: i64) -> Result<Session, AuthError> {
    // Identities may contain dots, so split from the right: signature,
    // then expiry, and the rest is the identity.
    let mut parts = token.rsplitn(3, '.');
    let signature = parts.next().ok_or(AuthError::Malformed)?;
    let expiry = parts.next().ok_or(AuthError::Malformed)?;
    let identity = parts.next().ok_or(AuthError::Malformed)?;

    let expires_at: i64 = expiry.parse().map_err(|_| AuthError::Malformed)?;
    let signature_bytes = hex::decode(signature).map_err(|_| AuthError::Malformed)?;
    if identity.chars().any(char::is_control) {
        return Err(AuthError::Malformed);
    }

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(format!("{identity}.{expires_at}").as_bytes());
    mac.verify_slice(&signature_bytes)
        .map_err(|_| AuthError::BadSignature)?;

    if identity.is_empty() {
        return Err(AuthError::EmptyIdentity);
    }
    if now >= expires_at {
        return Err(AuthError::Expired);
    }

    Ok(Session {
        identity: identity.to_string(),
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-relay-secret";

    #[test]
    fn mint_then_verify() {
        let token = mint_token("alice", 2_000_000_000, SECRET);
        let session = verify_token(&token, SECRET, 1_000_000_000).unwrap();
        assert_eq!(session.identity, "alice");
        assert_eq!(session.expires_at, 2_000_000_000);
    }

    #[test]
    fn identity_with_dots_survives() {
        let token = mint_token("alice.v2", 2_000_000_000, SECRET);
        let session = verify_token(&token, SECRET, 0).unwrap();
        assert_eq!(session.identity, "alice.v2");
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let token = mint_token("alice", 2_000_000_000, SECRET);
        let mut tampered = token.clone();
        let flipped = if token.ends_with('0') { '1' } else { '0' };
        tampered.pop();
        tampered.push(flipped);
        assert_eq!(
            verify_token(&tampered, SECRET, 0),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = mint_token("alice", 2_000_000_000, SECRET);
        assert_eq!(
            verify_token(&token, b"other-secret", 0),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn tampered_identity_is_rejected() {
        let token = mint_token("alice", 2_000_000_000, SECRET);
        let forged = token.replacen("alice", "mallory", 1);
        assert_eq!(verify_token(&forged, SECRET, 0), Err(AuthError::BadSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = mint_token("alice", 1_000, SECRET);
        assert_eq!(verify_token(&token, SECRET, 1_000), Err(AuthError::Expired));
        assert_eq!(verify_token(&token, SECRET, 2_000), Err(AuthError::Expired));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert_eq!(verify_token("", SECRET, 0), Err(AuthError::Malformed));
        assert_eq!(verify_token("alice", SECRET, 0), Err(AuthError::Malformed));
        assert_eq!(
            verify_token("alice.notanumber.abcd", SECRET, 0),
            Err(AuthError::Malformed)
        );
        assert_eq!(
            verify_token("alice.123.nothex!", SECRET, 0),
            Err(AuthError::Malformed)
        );
    }

    #[test]
    fn empty_identity_is_rejected() {
        let token = mint_token("", 2_000_000_000, SECRET);
        assert_eq!(verify_token(&token, SECRET, 0), Err(AuthError::EmptyIdentity));
    }
}
