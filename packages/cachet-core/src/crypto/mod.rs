//! # Cryptography Module
//!
//! Client-side primitives for the Cachet hybrid encryption scheme.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     ENCRYPTION SCHEME                               │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  Short payloads (chat text, wrapped keys)                           │
//! │  ──────────────────────────────────────────                         │
//! │  RSA-2048 / OAEP / SHA-256, e = 65537                               │
//! │  Payload bound: 256 − 2·32 − 2 = 190 bytes                          │
//! │                                                                     │
//! │  Bulk payloads (file content, any length)                           │
//! │  ─────────────────────────────────────────                          │
//! │  1. Fresh 256-bit AES-GCM key + 96-bit IV per message               │
//! │  2. sealed_file = IV ‖ AES-256-GCM(key, IV, bytes)                  │
//! │  3. sealed_key  = RSA-OAEP(recipient_pub, key)                      │
//! │                                                                     │
//! │  RSA never sees more than 32 bytes of key material; AES carries     │
//! │  the bulk. Keypairs are static and long-lived — no ratcheting.      │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The operations are exposed behind the [`CryptoProvider`] capability
//! trait so a different compliant backend can be swapped in; the shipped
//! implementation is [`RustCryptoProvider`].

pub mod asymmetric;
pub mod hybrid;
mod provider;

pub use asymmetric::{PrivateKeyMaterial, PublicKey};
pub use provider::{CryptoProvider, RustCryptoProvider};

/// RSA modulus size in bits.
pub const RSA_MODULUS_BITS: usize = 2048;

/// Largest plaintext RSA-OAEP accepts for this modulus/hash pair:
/// k − 2·hLen − 2 with k = 256 and hLen = 32 (SHA-256).
pub const MAX_OAEP_PLAINTEXT: usize = RSA_MODULUS_BITS / 8 - 2 * 32 - 2;

/// Size of the one-time symmetric file key in bytes (256 bits).
pub const FILE_KEY_SIZE: usize = 32;

/// Size of the AES-GCM IV prefixed onto sealed files (96 bits).
pub const FILE_IV_SIZE: usize = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oaep_bound_is_190_bytes() {
        assert_eq!(MAX_OAEP_PLAINTEXT, 190);
    }
}
