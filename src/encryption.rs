//! Encryption stage
//!
//! Encrypts a marked asset with AES-256-GCM under the per-creator symmetric
//! key resolved by the key lifecycle manager. Used only for commercial
//! distribution; public assets skip this stage. The nonce is prepended to the
//! ciphertext so decryption needs nothing beyond the key bytes.

use crate::error::{MedialockError, MedialockResult};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use rand::RngCore;
use std::fs;
use std::path::Path;

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// File encryptor keyed by raw KMS key material
pub struct AssetEncryptor;

impl AssetEncryptor {
    fn cipher(key_bytes: &[u8]) -> MedialockResult<Aes256Gcm> {
        if key_bytes.len() != KEY_SIZE {
            return Err(MedialockError::EncryptionFailed(format!(
                "expected {} key bytes, got {}",
                KEY_SIZE,
                key_bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Aes256Gcm::new(key))
    }

    /// Encrypt `input` into `output` as `nonce || ciphertext`.
    pub fn encrypt_file(input: &Path, output: &Path, key_bytes: &[u8]) -> MedialockResult<()> {
        let cipher = Self::cipher(key_bytes)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = fs::read(input)?;
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|e| MedialockError::EncryptionFailed(e.to_string()))?;

        let mut framed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        framed.extend_from_slice(&nonce_bytes);
        framed.extend_from_slice(&ciphertext);
        fs::write(output, framed)?;
        Ok(())
    }

    /// Decrypt a `nonce || ciphertext` file produced by `encrypt_file`.
    pub fn decrypt_file(input: &Path, output: &Path, key_bytes: &[u8]) -> MedialockResult<()> {
        let plaintext = Self::decrypt_bytes(&fs::read(input)?, key_bytes)?;
        fs::write(output, plaintext)?;
        Ok(())
    }

    pub fn decrypt_bytes(framed: &[u8], key_bytes: &[u8]) -> MedialockResult<Vec<u8>> {
        let cipher = Self::cipher(key_bytes)?;
        if framed.len() < NONCE_SIZE {
            return Err(MedialockError::DecryptionFailed(
                "ciphertext shorter than nonce".to_string(),
            ));
        }
        let (nonce_bytes, ciphertext) = framed.split_at(NONCE_SIZE);
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| {
                MedialockError::DecryptionFailed("wrong key or corrupted ciphertext".to_string())
            })
    }
}
