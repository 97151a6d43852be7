//! Public-key directory client.
//!
//! Consumes the external directory's HTTP surface: `POST /keys/me` to
//! publish this client's public key and `GET /keys/{identity}` to
//! resolve a recipient's. Successful lookups are cached for the
//! lifetime of the client session; there is no invalidation, so a peer
//! that re-uploads mid-session is seen stale until reconnect.

use std::collections::HashMap;

use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::crypto::asymmetric::{self, PublicKey};
use crate::error::{Error, Result};
use crate::vault::KeyVault;

/// Body of a key upload / lookup response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyRecordBody {
    public_key: String,
}

/// HTTP client for the identity → public key directory.
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    cache: RwLock<HashMap<String, PublicKey>>,
}

impl DirectoryClient {
    /// Create a client against `base_url` (no trailing slash required).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve an identity's public key, preferring the session cache.
    ///
    /// A 404 from the directory becomes [`Error::KeyNotFound`], which
    /// callers use to abort a send before any envelope is written.
    pub async fn lookup(&self, identity: &str) -> Result<PublicKey> {
        if let Some(key) = self.cache.read().get(identity) {
            return Ok(key.clone());
        }

        let url = format!(
            "{}/keys/{}",
            self.base_url,
            urlencoding::encode(identity)
        );
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::KeyNotFound(identity.to_string()));
        }
        let record: KeyRecordBody = response.error_for_status()?.json().await?;

        let key = asymmetric::import_public_key(&record.public_key)?;
        self.cache
            .write()
            .insert(identity.to_string(), key.clone());
        tracing::debug!(identity, "cached public key from directory");
        Ok(key)
    }

    /// Publish a public key under the bearer token's identity.
    pub async fn upload(&self, public_key_pem: &str, token: &str) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/keys/me", self.base_url))
            .bearer_auth(token)
            .json(&KeyRecordBody {
                public_key: public_key_pem.to_string(),
            })
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        response.error_for_status()?;
        Ok(())
    }

    /// Publish the vault's public key.
    pub async fn publish_keys(&self, vault: &KeyVault, token: &str) -> Result<()> {
        let pem = vault.public_key_pem()?;
        self.upload(&pem, token).await
    }

    #[cfg(test)]
    pub(crate) fn prime_cache(&self, identity: &str, key: PublicKey) {
        self.cache.write().insert(identity.to_string(), key);
    }
}

/// Run the client's key-setup sequence once per session: open the vault
/// (generating a keypair if absent), then publish the public half.
///
/// Explicitly sequential with a typed outcome — key setup is not a
/// fire-and-forget side effect.
pub async fn ensure_keys_published(
    vault_path: impl AsRef<std::path::Path>,
    directory: &DirectoryClient,
    token: &str,
) -> Result<KeyVault> {
    let vault = KeyVault::open(vault_path)?;
    directory.publish_keys(&vault, token).await?;
    Ok(vault)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::asymmetric::generate_keypair;

    #[tokio::test]
    async fn cached_key_is_served_without_network() {
        // Base URL points nowhere; a cache hit must not touch it.
        let directory = DirectoryClient::new("http://127.0.0.1:1/unreachable");
        let (public, _) = generate_keypair().unwrap();
        directory.prime_cache("alice", public.clone());

        let resolved = directory.lookup("alice").await.unwrap();
        assert_eq!(resolved, public);
    }

    #[tokio::test]
    async fn lookup_without_cache_needs_the_directory() {
        let directory = DirectoryClient::new("http://127.0.0.1:1/unreachable");
        assert!(matches!(
            directory.lookup("alice").await,
            Err(Error::Directory(_))
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let directory = DirectoryClient::new("http://example.test/");
        assert_eq!(directory.base_url, "http://example.test");
    }

    #[test]
    fn key_record_body_uses_camel_case() {
        let body = KeyRecordBody {
            public_key: "PEM".into(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"publicKey":"PEM"}"#);
    }
}
