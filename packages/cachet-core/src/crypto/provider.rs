//! Crypto capability interface.
//!
//! The core never calls a crypto backend directly; everything goes
//! through [`CryptoProvider`], which exposes exactly the keypair,
//! short-payload and hybrid-file operations the protocol needs. Any
//! compliant crypto library can stand behind it; the shipped backend is
//! [`RustCryptoProvider`] (RustCrypto `rsa` + `aes-gcm`).

use crate::crypto::asymmetric::{self, PrivateKeyMaterial, PublicKey};
use crate::crypto::hybrid;
use crate::error::Result;

/// Capability interface over the client's cryptographic operations.
pub trait CryptoProvider: Send + Sync {
    /// Generate a fresh long-lived keypair.
    fn generate_keypair(&self) -> Result<(PublicKey, PrivateKeyMaterial)>;

    /// Export a public key as PEM-wrapped SPKI DER.
    fn export_public_key(&self, key: &PublicKey) -> Result<String>;

    /// Import a PEM-encoded SPKI public key.
    fn import_public_key(&self, pem: &str) -> Result<PublicKey>;

    /// Encrypt a short payload; returns base64 ciphertext.
    fn encrypt(&self, plaintext: &[u8], key: &PublicKey) -> Result<String>;

    /// Decrypt base64 ciphertext produced by [`CryptoProvider::encrypt`].
    fn decrypt(&self, ciphertext: &str, key: &PrivateKeyMaterial) -> Result<Vec<u8>>;

    /// Seal an arbitrary-length payload; returns `(sealed_file, sealed_key)`.
    fn encrypt_file(&self, bytes: &[u8], key: &PublicKey) -> Result<(Vec<u8>, String)>;

    /// Open a sealed payload produced by [`CryptoProvider::encrypt_file`].
    fn decrypt_file(
        &self,
        sealed_file: &[u8],
        sealed_key: &str,
        key: &PrivateKeyMaterial,
    ) -> Result<Vec<u8>>;
}

/// The default pure-Rust backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    fn generate_keypair(&self) -> Result<(PublicKey, PrivateKeyMaterial)> {
        asymmetric::generate_keypair()
    }

    fn export_public_key(&self, key: &PublicKey) -> Result<String> {
        asymmetric::export_public_key(key)
    }

    fn import_public_key(&self, pem: &str) -> Result<PublicKey> {
        asymmetric::import_public_key(pem)
    }

    fn encrypt(&self, plaintext: &[u8], key: &PublicKey) -> Result<String> {
        asymmetric::encrypt(plaintext, key)
    }

    fn decrypt(&self, ciphertext: &str, key: &PrivateKeyMaterial) -> Result<Vec<u8>> {
        asymmetric::decrypt(ciphertext, key)
    }

    fn encrypt_file(&self, bytes: &[u8], key: &PublicKey) -> Result<(Vec<u8>, String)> {
        hybrid::encrypt_file(bytes, key)
    }

    fn decrypt_file(
        &self,
        sealed_file: &[u8],
        sealed_key: &str,
        key: &PrivateKeyMaterial,
    ) -> Result<Vec<u8>> {
        hybrid::decrypt_file(sealed_file, sealed_key, key)
    }
}
