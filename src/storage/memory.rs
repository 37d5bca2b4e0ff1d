//! In-memory object store for tests and development

use super::ObjectStore;
use crate::error::{MedialockError, MedialockResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

#[derive(Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type_of(&self, key: &str) -> MedialockResult<String> {
        let objects = self.objects.lock()?;
        objects
            .get(key)
            .map(|o| o.content_type.clone())
            .ok_or_else(|| MedialockError::ObjectNotFound(key.to_string()))
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> MedialockResult<()> {
        let mut objects = self.objects.lock()?;
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> MedialockResult<Vec<u8>> {
        let objects = self.objects.lock()?;
        objects
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| MedialockError::ObjectNotFound(key.to_string()))
    }

    fn exists(&self, key: &str) -> MedialockResult<bool> {
        let objects = self.objects.lock()?;
        Ok(objects.contains_key(key))
    }

    fn copy(&self, from: &str, to: &str) -> MedialockResult<()> {
        let mut objects = self.objects.lock()?;
        let object = objects
            .get(from)
            .cloned()
            .ok_or_else(|| MedialockError::ObjectNotFound(from.to_string()))?;
        objects.insert(to.to_string(), object);
        Ok(())
    }

    fn delete(&self, key: &str) -> MedialockResult<()> {
        let mut objects = self.objects.lock()?;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| MedialockError::ObjectNotFound(key.to_string()))
    }

    fn presign(&self, key: &str, ttl: Duration) -> MedialockResult<Url> {
        let objects = self.objects.lock()?;
        if !objects.contains_key(key) {
            return Err(MedialockError::ObjectNotFound(key.to_string()));
        }
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Url::parse(&format!(
            "https://objects.local/{}?expires={}",
            key, expires
        ))
        .map_err(|e| MedialockError::Storage(format!("presign url build failed: {}", e)))
    }
}
