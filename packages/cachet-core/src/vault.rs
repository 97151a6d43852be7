//! # Key Vault
//!
//! Owns the client's private key material. The vault is opened against
//! one local file: if the file exists the key is loaded from it,
//! otherwise a fresh keypair is generated and persisted — written once,
//! read on every subsequent open.
//!
//! The private key never leaves the vault: callers get the public half
//! and decrypt operations, nothing else, and nothing here serializes
//! the key onto the wire.

use std::fs;
use std::path::{Path, PathBuf};

use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::crypto::asymmetric::{self, PrivateKeyMaterial, PublicKey};
use crate::crypto::hybrid;
use crate::error::{Error, Result};

/// Local store for one client's keypair.
pub struct KeyVault {
    public: PublicKey,
    material: PrivateKeyMaterial,
    path: PathBuf,
}

impl KeyVault {
    /// Open the vault at `path`, generating and persisting a keypair on
    /// first use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Self::generate(path)
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let pem = fs::read_to_string(path)?;
        let private = RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|_| {
            Error::InvalidKeyFormat("stored private key is not valid PKCS#8 PEM".into())
        })?;
        let public = RsaPublicKey::from(&private);
        tracing::debug!(path = %path.display(), "key vault loaded");
        Ok(Self {
            public: PublicKey(public),
            material: PrivateKeyMaterial(private),
            path: path.to_path_buf(),
        })
    }

    fn generate(path: &Path) -> Result<Self> {
        let (public, material) = asymmetric::generate_keypair()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let pem = material
            .0
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::KeyEncoding(e.to_string()))?;
        fs::write(path, pem.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!(path = %path.display(), "generated new keypair");
        Ok(Self {
            public,
            material,
            path: path.to_path_buf(),
        })
    }

    /// The public half of the stored keypair.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The public key as PEM-wrapped SPKI, ready for directory upload.
    pub fn public_key_pem(&self) -> Result<String> {
        asymmetric::export_public_key(&self.public)
    }

    /// Decrypt a short base64 ciphertext addressed to this client.
    pub fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>> {
        asymmetric::decrypt(ciphertext, &self.material)
    }

    /// Open a sealed file addressed to this client.
    pub fn decrypt_file(&self, sealed_file: &[u8], sealed_key: &str) -> Result<Vec<u8>> {
        hybrid::decrypt_file(sealed_file, sealed_key, &self.material)
    }

    /// Where the key material is persisted.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::asymmetric::encrypt;

    #[test]
    fn open_generates_then_reloads_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.pem");

        let vault = KeyVault::open(&path).unwrap();
        assert!(path.exists());
        let pem_first = vault.public_key_pem().unwrap();

        let reopened = KeyVault::open(&path).unwrap();
        assert_eq!(reopened.public_key_pem().unwrap(), pem_first);
    }

    #[test]
    fn reloaded_vault_decrypts_old_ciphertext() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.pem");

        let vault = KeyVault::open(&path).unwrap();
        let ciphertext = encrypt(b"persisted", vault.public_key()).unwrap();
        drop(vault);

        let reopened = KeyVault::open(&path).unwrap();
        assert_eq!(reopened.decrypt(&ciphertext).unwrap(), b"persisted");
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/keys/identity.pem");
        KeyVault::open(&path).unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.pem");
        KeyVault::open(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupted_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.pem");
        fs::write(&path, "not a private key").unwrap();

        assert!(matches!(
            KeyVault::open(&path),
            Err(Error::InvalidKeyFormat(_))
        ));
    }
}
