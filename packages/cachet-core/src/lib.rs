//! # Cachet Core
//!
//! Client-side library for Cachet end-to-end encrypted messaging: the
//! key lifecycle, the hybrid encryption scheme, and the directory and
//! relay clients. The relay only ever sees opaque ciphertext.
//!
//! ## Data Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  KeyVault ── generate/load keypair ──► DirectoryClient (publish)    │
//! │                                                                     │
//! │  send: resolve recipient key (cache → directory)                    │
//! │        └─► RSA-OAEP (text) / AES-GCM + wrapped key (files)          │
//! │            └─► RelayClient ──► relay forwards verbatim ──► peer     │
//! │                                                                     │
//! │  receive: RelayClient ──► KeyVault decrypts locally ──► ClientEvent │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the whole library
//! - [`crypto`] - RSA-OAEP + hybrid AES-GCM primitives behind
//!   [`crypto::CryptoProvider`]
//! - [`vault`] - Local, never-on-the-wire private key storage
//! - [`directory`] - Public-key directory HTTP client with a
//!   session-lifetime cache
//! - [`client`] - Relay WebSocket client and decrypted event stream

#![warn(missing_docs)]

pub mod client;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod vault;

pub use client::{ClientEvent, RelayClient, UNDECRYPTABLE_PLACEHOLDER};
pub use crypto::{CryptoProvider, PrivateKeyMaterial, PublicKey, RustCryptoProvider};
pub use directory::{ensure_keys_published, DirectoryClient};
pub use error::{Error, Result};
pub use vault::KeyVault;
