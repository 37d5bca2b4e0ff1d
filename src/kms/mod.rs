//! Cloud key-management abstraction and the alias lifecycle built on it
//!
//! The KMS itself is a consumed collaborator: symmetric key creation, alias
//! lookup/bind/unbind, and raw key material for license issuance. The
//! lifecycle manager layers the alias epochs and idempotent rename semantics
//! on top.

pub mod lifecycle;
pub mod memory;

pub use lifecycle::KeyLifecycle;
pub use memory::MemoryKms;

use crate::error::MedialockResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque KMS key identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(pub String);

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Alias for a creator's pre-mint key
pub fn creator_alias(wallet: &str) -> String {
    format!("alias/{}", wallet)
}

/// Alias for a minted token's key; terminal epoch, never renamed again
pub fn token_alias(token_id: &str) -> String {
    format!("alias/{}", token_id)
}

/// Cloud KMS operations consumed by the lifecycle manager
///
/// Implementations must make "alias not bound" distinguishable from transport
/// failures: `describe_alias` returns `Ok(None)`, `create_alias` on a bound
/// alias fails with [`crate::error::MedialockError::AliasBound`], and
/// `delete_alias` on an unbound alias fails with
/// [`crate::error::MedialockError::AliasNotFound`].
pub trait KmsApi: Send + Sync {
    /// Create a new symmetric encrypt/decrypt key.
    fn create_key(&self) -> MedialockResult<KeyId>;

    /// Schedule an unreferenced key for deletion.
    fn delete_key(&self, key: &KeyId) -> MedialockResult<()>;

    /// Resolve an alias to its key id; `None` when the alias is unbound.
    fn describe_alias(&self, alias: &str) -> MedialockResult<Option<KeyId>>;

    /// Bind an alias to a key. Fails with `AliasBound` if already bound.
    fn create_alias(&self, alias: &str, key: &KeyId) -> MedialockResult<()>;

    /// Unbind an alias. Fails with `AliasNotFound` if not bound.
    fn delete_alias(&self, alias: &str) -> MedialockResult<()>;

    /// Raw key bytes, used only to construct license grants.
    fn key_material(&self, key: &KeyId) -> MedialockResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_forms() {
        assert_eq!(creator_alias("0xabc"), "alias/0xabc");
        assert_eq!(token_alias("42"), "alias/42");
    }
}
