//! Storage dispatcher
//!
//! Thin layer over an [`ObjectStore`] that owns the storage-side policies:
//! content addressing for public assets, content-type selection, the
//! configured presign TTL, and the copy-then-delete rename that keeps object
//! keys in lockstep with key-alias renames at mint.

use super::ObjectStore;
use crate::error::{MedialockError, MedialockResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const CONTENT_TYPE_VIDEO: &str = "video/mp4";
pub const CONTENT_TYPE_OPAQUE: &str = "application/octet-stream";

pub struct StorageDispatcher {
    store: Arc<dyn ObjectStore>,
    presign_ttl: Duration,
}

impl StorageDispatcher {
    pub fn new(store: Arc<dyn ObjectStore>, presign_ttl: Duration) -> Self {
        Self { store, presign_ttl }
    }

    /// Hex SHA-256 of the asset bytes, used as the public object address.
    pub fn content_address(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    /// Upload a local artifact under `key`.
    pub fn put_file(&self, local: &Path, key: &str, content_type: &str) -> MedialockResult<()> {
        let bytes = fs::read(local)?;
        self.put_bytes(&bytes, key, content_type)
    }

    pub fn put_bytes(&self, bytes: &[u8], key: &str, content_type: &str) -> MedialockResult<()> {
        self.store.put(key, bytes, content_type)?;
        tracing::debug!(%key, size = bytes.len(), "object stored");
        Ok(())
    }

    pub fn get(&self, key: &str) -> MedialockResult<Vec<u8>> {
        self.store.get(key)
    }

    pub fn exists(&self, key: &str) -> MedialockResult<bool> {
        self.store.exists(key)
    }

    /// Presigned retrieval URL with the configured TTL.
    pub fn presign(&self, key: &str) -> MedialockResult<Url> {
        self.store.presign(key, self.presign_ttl)
    }

    /// Move an object from `old_key` to `new_key`: copy, then delete the
    /// source.
    ///
    /// Safe to retry after a crash at any point. A missing source with the
    /// destination present means a prior attempt already copied; a missing
    /// source with no destination is a real loss and surfaces as a storage
    /// error.
    pub fn rename(&self, old_key: &str, new_key: &str) -> MedialockResult<()> {
        if !self.store.exists(old_key)? {
            if self.store.exists(new_key)? {
                // Retry of a rename whose copy already landed.
                return self.delete_tolerant(old_key);
            }
            return Err(MedialockError::Storage(format!(
                "rename source '{}' missing and destination '{}' absent",
                old_key, new_key
            )));
        }

        self.store.copy(old_key, new_key)?;
        self.delete_tolerant(old_key)?;
        tracing::info!(%old_key, %new_key, "object renamed");
        Ok(())
    }

    fn delete_tolerant(&self, key: &str) -> MedialockResult<()> {
        match self.store.delete(key) {
            Ok(()) | Err(MedialockError::ObjectNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
