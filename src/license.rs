//! License grants
//!
//! A grant is a transient, caller-scoped re-encryption of a KMS key's raw
//! bytes under a cipher keyed by the caller's current bearer token. It is
//! constructed per request, handed to exactly one caller, and never
//! persisted. Raw key bytes never leave this module in the clear.

use crate::encryption::AssetEncryptor;
use crate::error::{MedialockError, MedialockResult};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const NONCE_SIZE: usize = 12;

/// Caller-scoped decryption material for one commercial asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseGrant {
    /// Token id the grant applies to
    pub token_id: String,

    /// base64(nonce || ciphertext) of the re-encrypted key bytes
    pub blob: String,

    /// Cipher used for the re-encryption
    pub algorithm: String,

    pub issued_at: DateTime<Utc>,
}

/// Derive the grant cipher key from the caller's bearer token.
fn token_key(bearer_token: &str) -> [u8; 32] {
    let digest = Sha256::digest(bearer_token.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

/// Re-encrypt raw key bytes under the caller's bearer token.
pub fn seal_key(
    token_id: &str,
    key_bytes: &[u8],
    bearer_token: &str,
) -> MedialockResult<LicenseGrant> {
    let grant_key = token_key(bearer_token);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&grant_key));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, key_bytes)
        .map_err(|e| MedialockError::EncryptionFailed(e.to_string()))?;

    let mut framed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    framed.extend_from_slice(&nonce_bytes);
    framed.extend_from_slice(&ciphertext);

    Ok(LicenseGrant {
        token_id: token_id.to_string(),
        blob: general_purpose::STANDARD.encode(framed),
        algorithm: "AES-256-GCM".to_string(),
        issued_at: Utc::now(),
    })
}

/// Recover the raw key bytes from a grant. Client-side counterpart of
/// [`seal_key`]; also exercised by tests to prove the round trip.
pub fn open_grant(grant: &LicenseGrant, bearer_token: &str) -> MedialockResult<Vec<u8>> {
    let framed = general_purpose::STANDARD.decode(&grant.blob)?;
    AssetEncryptor::decrypt_bytes(&framed, &token_key(bearer_token))
}
