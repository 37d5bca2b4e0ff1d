//! In-memory KMS for tests and development
//!
//! Mirrors the alias semantics of a real cloud KMS: aliases resolve to at
//! most one key id, double-binding fails with `AliasBound`, and deleting an
//! unbound alias fails with `AliasNotFound`.

use super::{KeyId, KmsApi};
use crate::error::{MedialockError, MedialockResult};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

const KEY_SIZE: usize = 32;

#[derive(Default)]
struct Inner {
    /// key id -> raw symmetric key material
    keys: HashMap<String, Vec<u8>>,
    /// alias -> key id
    aliases: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemoryKms {
    inner: Mutex<Inner>,
}

impl MemoryKms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys, for leak assertions in tests
    pub fn key_count(&self) -> usize {
        self.inner.lock().unwrap().keys.len()
    }
}

impl KmsApi for MemoryKms {
    fn create_key(&self) -> MedialockResult<KeyId> {
        let mut material = vec![0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut material);
        let id = Uuid::new_v4().to_string();

        let mut inner = self.inner.lock()?;
        inner.keys.insert(id.clone(), material);
        Ok(KeyId(id))
    }

    fn delete_key(&self, key: &KeyId) -> MedialockResult<()> {
        let mut inner = self.inner.lock()?;
        inner
            .keys
            .remove(&key.0)
            .map(|_| ())
            .ok_or_else(|| MedialockError::KeyNotFound(key.0.clone()))
    }

    fn describe_alias(&self, alias: &str) -> MedialockResult<Option<KeyId>> {
        let inner = self.inner.lock()?;
        Ok(inner.aliases.get(alias).cloned().map(KeyId))
    }

    fn create_alias(&self, alias: &str, key: &KeyId) -> MedialockResult<()> {
        let mut inner = self.inner.lock()?;
        if !inner.keys.contains_key(&key.0) {
            return Err(MedialockError::KeyNotFound(key.0.clone()));
        }
        if inner.aliases.contains_key(alias) {
            return Err(MedialockError::AliasBound(alias.to_string()));
        }
        inner.aliases.insert(alias.to_string(), key.0.clone());
        Ok(())
    }

    fn delete_alias(&self, alias: &str) -> MedialockResult<()> {
        let mut inner = self.inner.lock()?;
        inner
            .aliases
            .remove(alias)
            .map(|_| ())
            .ok_or_else(|| MedialockError::AliasNotFound(alias.to_string()))
    }

    fn key_material(&self, key: &KeyId) -> MedialockResult<Vec<u8>> {
        let inner = self.inner.lock()?;
        inner
            .keys
            .get(&key.0)
            .cloned()
            .ok_or_else(|| MedialockError::KeyNotFound(key.0.clone()))
    }
}
