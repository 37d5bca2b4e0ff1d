//! Key lifecycle manager
//!
//! Owns the alias state machine per creator-upload session:
//! `UNBOUND -> CREATOR_SCOPED` on the first commercial upload, then
//! `CREATOR_SCOPED -> TOKEN_SCOPED` at mint. Token scope is terminal.
//!
//! All mutating operations are written to survive races and crashes:
//! `create_if_absent` tolerates a concurrent bind, and `rename` binds the new
//! alias before deleting the old one so a failure in between leaves the key
//! reachable rather than orphaned.

use super::{KeyId, KmsApi};
use crate::error::{MedialockError, MedialockResult};
use std::sync::Arc;

pub struct KeyLifecycle {
    kms: Arc<dyn KmsApi>,
}

impl KeyLifecycle {
    pub fn new(kms: Arc<dyn KmsApi>) -> Self {
        Self { kms }
    }

    /// Resolve an alias; `None` when unbound. Unbound is not an error.
    pub fn get_or_none(&self, alias: &str) -> MedialockResult<Option<KeyId>> {
        self.kms.describe_alias(alias)
    }

    /// Idempotent create: look up first, create and bind only when absent.
    ///
    /// Under a race, both callers look up a miss and both create a key, but
    /// only one bind wins; the loser discards its key and adopts the winner's
    /// id, so at most one key id is ever produced per alias.
    pub fn create_if_absent(&self, alias: &str) -> MedialockResult<KeyId> {
        if let Some(existing) = self.kms.describe_alias(alias)? {
            return Ok(existing);
        }

        let candidate = self.kms.create_key()?;
        match self.kms.create_alias(alias, &candidate) {
            Ok(()) => {
                tracing::info!(%alias, key = %candidate, "created key and bound alias");
                Ok(candidate)
            }
            Err(MedialockError::AliasBound(_)) => {
                // Lost the bind race: the candidate key is unreferenced.
                if let Err(e) = self.kms.delete_key(&candidate) {
                    tracing::warn!(key = %candidate, error = %e, "failed to discard losing key");
                }
                self.kms.describe_alias(alias)?.ok_or_else(|| {
                    MedialockError::KeyBinding {
                        alias: alias.to_string(),
                        message: "alias vanished after concurrent bind".to_string(),
                        retryable: true,
                    }
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Move a key from `old_alias` to `new_alias`: bind-new, then delete-old.
    ///
    /// Safe to retry after a crash at any point: a new alias already bound to
    /// the same key counts as success, and a missing old alias means a prior
    /// attempt already finished the delete.
    pub fn rename(&self, old_alias: &str, new_alias: &str, key: &KeyId) -> MedialockResult<()> {
        match self.kms.create_alias(new_alias, key) {
            Ok(()) => {}
            Err(MedialockError::AliasBound(_)) => {
                let bound = self.kms.describe_alias(new_alias)?;
                if bound.as_ref() != Some(key) {
                    return Err(MedialockError::KeyBinding {
                        alias: new_alias.to_string(),
                        message: format!(
                            "alias already bound to a different key ({:?})",
                            bound.map(|k| k.0)
                        ),
                        retryable: false,
                    });
                }
                // Retry of a rename that already bound the new alias.
            }
            Err(e) => return Err(e),
        }

        self.delete(old_alias)?;
        tracing::info!(%old_alias, %new_alias, key = %key, "alias renamed");
        Ok(())
    }

    /// Unbind an alias; already-unbound is treated as success.
    pub fn delete(&self, alias: &str) -> MedialockResult<()> {
        match self.kms.delete_alias(alias) {
            Ok(()) | Err(MedialockError::AliasNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Raw key bytes for license issuance. Never log the result.
    pub fn key_material(&self, key: &KeyId) -> MedialockResult<Vec<u8>> {
        self.kms.key_material(key)
    }
}
