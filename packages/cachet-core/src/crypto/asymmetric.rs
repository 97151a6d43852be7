//! RSA-OAEP asymmetric cipher.
//!
//! Generates, imports and exports 2048-bit RSA keypairs and encrypts
//! short payloads under OAEP/SHA-256. Anything larger than the
//! [`MAX_OAEP_PLAINTEXT`] bound must go through the hybrid cipher —
//! this module refuses it up front rather than letting the backend fail.

use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::crypto::{MAX_OAEP_PLAINTEXT, RSA_MODULUS_BITS};
use crate::error::{Error, Result};

/// A recipient's public encryption key.
#[derive(Clone, Debug, PartialEq)]
pub struct PublicKey(pub(crate) RsaPublicKey);

/// The client's private key material.
///
/// Owned exclusively by one [`KeyVault`](crate::vault::KeyVault)
/// instance and persisted only in that client's local storage.
/// Invariant: never serialized onto the wire.
pub struct PrivateKeyMaterial(pub(crate) RsaPrivateKey);

impl std::fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs and panics.
        f.write_str("PrivateKeyMaterial(..)")
    }
}

/// Generate a fresh RSA-2048 OAEP keypair (e = 65537).
///
/// There is no error path under normal operation; a failure here means
/// the system entropy source is broken, which is fatal for the client.
pub fn generate_keypair() -> Result<(PublicKey, PrivateKeyMaterial)> {
    let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, RSA_MODULUS_BITS)
        .map_err(|e| Error::KeyGeneration(e.to_string()))?;
    let public = RsaPublicKey::from(&private);
    Ok((PublicKey(public), PrivateKeyMaterial(private)))
}

/// Export a public key as PEM-wrapped SPKI DER.
pub fn export_public_key(key: &PublicKey) -> Result<String> {
    key.0
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| Error::KeyEncoding(e.to_string()))
}

/// Import a PEM-encoded SPKI public key.
///
/// Fails with [`Error::InvalidKeyFormat`] when the string is empty,
/// lacks PEM delimiters, or does not decode as SPKI DER.
pub fn import_public_key(pem: &str) -> Result<PublicKey> {
    let trimmed = pem.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidKeyFormat("empty key string".into()));
    }
    if !trimmed.starts_with("-----BEGIN") {
        return Err(Error::InvalidKeyFormat("missing PEM delimiters".into()));
    }
    RsaPublicKey::from_public_key_pem(trimmed)
        .map(PublicKey)
        .map_err(|e| Error::InvalidKeyFormat(e.to_string()))
}

/// Encrypt a short payload under the recipient's public key.
///
/// Returns base64 ciphertext. Fails with [`Error::PlaintextTooLarge`]
/// beyond the OAEP bound — the reason file content never comes through
/// here directly.
pub fn encrypt(plaintext: &[u8], key: &PublicKey) -> Result<String> {
    if plaintext.len() > MAX_OAEP_PLAINTEXT {
        return Err(Error::PlaintextTooLarge {
            len: plaintext.len(),
            max: MAX_OAEP_PLAINTEXT,
        });
    }
    let ciphertext = key
        .0
        .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| Error::EncryptionFailed(e.to_string()))?;
    Ok(BASE64.encode(ciphertext))
}

/// Decrypt base64 ciphertext with the local private key.
///
/// Bad base64, padding failure and integrity failure all collapse into
/// the one opaque [`Error::DecryptionError`]; callers substitute a
/// placeholder instead of crashing.
pub fn decrypt(ciphertext: &str, key: &PrivateKeyMaterial) -> Result<Vec<u8>> {
    let raw = BASE64
        .decode(ciphertext)
        .map_err(|_| Error::DecryptionError)?;
    key.0
        .decrypt(Oaep::new::<Sha256>(), &raw)
        .map_err(|_| Error::DecryptionError)
}
