//! Hybrid file cipher.
//!
//! RSA-OAEP cannot encrypt arbitrary-length data, so bulk payloads ride
//! under a one-time 256-bit AES-GCM key and RSA only ever wraps that
//! 32-byte key. The sealed file is framed as `IV ‖ ciphertext` with a
//! 96-bit IV, matching the wire format consumed on the other end.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::asymmetric::{self, PrivateKeyMaterial, PublicKey};
use crate::crypto::{FILE_IV_SIZE, FILE_KEY_SIZE};
use crate::error::{Error, Result};

/// Seal an arbitrary-length payload for a recipient.
///
/// Returns `(sealed_file, sealed_key)` where `sealed_file` is
/// `IV ‖ AES-256-GCM ciphertext` and `sealed_key` is the base64
/// RSA-OAEP encryption of the raw one-time key.
pub fn encrypt_file(bytes: &[u8], recipient: &PublicKey) -> Result<(Vec<u8>, String)> {
    let mut key = Zeroizing::new([0u8; FILE_KEY_SIZE]);
    rand::rngs::OsRng.fill_bytes(key.as_mut());
    let mut iv = [0u8; FILE_IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| Error::EncryptionFailed(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), bytes)
        .map_err(|e| Error::EncryptionFailed(e.to_string()))?;

    let mut sealed_file = Vec::with_capacity(FILE_IV_SIZE + ciphertext.len());
    sealed_file.extend_from_slice(&iv);
    sealed_file.extend_from_slice(&ciphertext);

    // 32 bytes, comfortably under the OAEP bound.
    let sealed_key = asymmetric::encrypt(key.as_ref(), recipient)?;

    Ok((sealed_file, sealed_key))
}

/// Open a sealed payload with the local private key.
///
/// Either failing step — key unwrap or AES-GCM open (wrong key,
/// corrupted data, tag mismatch) — is the one opaque
/// [`Error::DecryptionError`]; nothing is surfaced bit-by-bit.
pub fn decrypt_file(
    sealed_file: &[u8],
    sealed_key: &str,
    key: &PrivateKeyMaterial,
) -> Result<Vec<u8>> {
    let file_key = Zeroizing::new(asymmetric::decrypt(sealed_key, key)?);
    if file_key.len() != FILE_KEY_SIZE || sealed_file.len() < FILE_IV_SIZE {
        return Err(Error::DecryptionError);
    }

    let cipher =
        Aes256Gcm::new_from_slice(file_key.as_ref()).map_err(|_| Error::DecryptionError)?;
    let (iv, ciphertext) = sealed_file.split_at(FILE_IV_SIZE);
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| Error::DecryptionError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::asymmetric::tests::KEYPAIR;

    #[test]
    fn round_trip_small_payload() {
        let (public, private) = &*KEYPAIR;
        let (sealed, sealed_key) = encrypt_file(b"attachment body", public).unwrap();
        assert_eq!(
            decrypt_file(&sealed, &sealed_key, private).unwrap(),
            b"attachment body"
        );
    }

    #[test]
    fn round_trip_empty_payload() {
        let (public, private) = &*KEYPAIR;
        let (sealed, sealed_key) = encrypt_file(b"", public).unwrap();
        assert_eq!(decrypt_file(&sealed, &sealed_key, private).unwrap(), b"");
    }

    #[test]
    fn round_trip_over_a_megabyte() {
        let (public, private) = &*KEYPAIR;
        let payload: Vec<u8> = (0..1_200_000u32).map(|i| (i % 251) as u8).collect();
        let (sealed, sealed_key) = encrypt_file(&payload, public).unwrap();
        assert_eq!(decrypt_file(&sealed, &sealed_key, private).unwrap(), payload);
    }

    #[test]
    fn sealed_file_is_iv_prefixed() {
        let (public, _) = &*KEYPAIR;
        let (sealed, _) = encrypt_file(b"xyz", public).unwrap();
        // IV + ciphertext + 16-byte tag
        assert_eq!(sealed.len(), FILE_IV_SIZE + 3 + 16);
    }

    #[test]
    fn single_bit_flip_in_ciphertext_is_detected() {
        let (public, private) = &*KEYPAIR;
        let (mut sealed, sealed_key) = encrypt_file(b"tamper target", public).unwrap();
        sealed[FILE_IV_SIZE] ^= 0x01;
        assert!(matches!(
            decrypt_file(&sealed, &sealed_key, private),
            Err(Error::DecryptionError)
        ));
    }

    #[test]
    fn tampered_iv_is_detected() {
        let (public, private) = &*KEYPAIR;
        let (mut sealed, sealed_key) = encrypt_file(b"tamper target", public).unwrap();
        sealed[0] ^= 0x80;
        assert!(matches!(
            decrypt_file(&sealed, &sealed_key, private),
            Err(Error::DecryptionError)
        ));
    }

    #[test]
    fn wrong_private_key_fails_opaquely() {
        let (public, _) = &*KEYPAIR;
        let (_, other_private) = asymmetric::generate_keypair().unwrap();
        let (sealed, sealed_key) = encrypt_file(b"not for you", public).unwrap();
        assert!(matches!(
            decrypt_file(&sealed, &sealed_key, &other_private),
            Err(Error::DecryptionError)
        ));
    }

    #[test]
    fn truncated_sealed_file_fails_opaquely() {
        let (public, private) = &*KEYPAIR;
        let (sealed, sealed_key) = encrypt_file(b"short", public).unwrap();
        assert!(matches!(
            decrypt_file(&sealed[..FILE_IV_SIZE - 2], &sealed_key, private),
            Err(Error::DecryptionError)
        ));
    }
}
