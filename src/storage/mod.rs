//! Object storage abstraction and the dispatcher built on it
//!
//! The store itself is a consumed collaborator (put/get/head/copy/delete plus
//! presigned URLs). The dispatcher layers content addressing and the
//! copy-then-delete rename that moves object keys between naming epochs in
//! lockstep with key aliases.

pub mod dispatcher;
pub mod memory;

pub use dispatcher::{StorageDispatcher, CONTENT_TYPE_OPAQUE, CONTENT_TYPE_VIDEO};
pub use memory::MemoryObjectStore;

use crate::error::MedialockResult;
use std::time::Duration;
use url::Url;

/// Object-storage operations consumed by the dispatcher
///
/// `get` on a missing key fails with
/// [`crate::error::MedialockError::ObjectNotFound`]; `exists` is the cheap
/// head-style probe that never errors on absence.
pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> MedialockResult<()>;

    fn get(&self, key: &str) -> MedialockResult<Vec<u8>>;

    fn exists(&self, key: &str) -> MedialockResult<bool>;

    fn copy(&self, from: &str, to: &str) -> MedialockResult<()>;

    fn delete(&self, key: &str) -> MedialockResult<()>;

    /// Time-boxed retrieval URL for a stored object.
    fn presign(&self, key: &str, ttl: Duration) -> MedialockResult<Url>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // The content-type constants are part of the module's surface; stages and
    // callers import them from here rather than from the dispatcher.
    #[test]
    fn test_content_types_reachable_at_module_path() {
        assert_eq!(CONTENT_TYPE_VIDEO, "video/mp4");
        assert_eq!(CONTENT_TYPE_OPAQUE, "application/octet-stream");
    }
}
