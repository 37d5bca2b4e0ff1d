use super::keys;
use crate::encryption::AssetEncryptor;
use crate::error::{MedialockError, MedialockResult};
use crate::kms::{creator_alias, KeyLifecycle};
use crate::pipeline::{PipelineContext, PipelineStage};
use crate::session::{DistributionMode, UploadState};
use crate::storage::StorageDispatcher;
use std::path::PathBuf;
use std::sync::Arc;

/// Encrypts the marked artifact under the creator's key
///
/// Commercial uploads only; public uploads skip this stage entirely. The
/// creator's profile avatar must already be stored, which proves the creator
/// completed registration before any key is minted for them.
pub struct EncryptStage {
    lifecycle: Arc<KeyLifecycle>,
    storage: Arc<StorageDispatcher>,
    work_dir: PathBuf,
}

impl EncryptStage {
    pub fn new(
        lifecycle: Arc<KeyLifecycle>,
        storage: Arc<StorageDispatcher>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            lifecycle,
            storage,
            work_dir: work_dir.into(),
        }
    }
}

impl PipelineStage for EncryptStage {
    fn execute(&self, context: &mut PipelineContext) -> MedialockResult<()> {
        let creator = context.get_string(keys::CREATOR)?;
        let artifact = context.get_path(keys::ARTIFACT_PATH)?;

        // Registration gate, checked before any key is created
        let avatar_key = format!("avatars/{}", creator);
        if !self.storage.exists(&avatar_key)? {
            return Err(MedialockError::PreconditionFailed(format!(
                "creator '{}' has no stored avatar",
                creator
            )));
        }

        let alias = creator_alias(&creator);
        let key_id = self.lifecycle.create_if_absent(&alias)?;
        let key_bytes = self.lifecycle.key_material(&key_id)?;

        let output = self
            .work_dir
            .join(format!("{}-encrypted.bin", context.session_id()));
        context.add_temp_file(output.clone());
        AssetEncryptor::encrypt_file(&artifact, &output, &key_bytes)?;

        context.set_path(keys::ARTIFACT_PATH, output);
        context.set_string(keys::KEY_ALIAS, alias);
        Ok(())
    }

    fn name(&self) -> &str {
        "Encrypt Asset"
    }

    fn completes(&self) -> Option<UploadState> {
        Some(UploadState::Encrypted)
    }

    fn should_skip(&self, context: &PipelineContext) -> bool {
        context.mode() == DistributionMode::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kms::MemoryKms;
    use crate::storage::{MemoryObjectStore, CONTENT_TYPE_OPAQUE};
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    const WALLET: &str = "0xaa01aa01aa01aa01aa01aa01aa01aa01aa01aa01";

    fn stage(dir: &TempDir) -> (Arc<StorageDispatcher>, Arc<KeyLifecycle>, EncryptStage) {
        let storage = Arc::new(StorageDispatcher::new(
            Arc::new(MemoryObjectStore::new()),
            Duration::from_secs(600),
        ));
        let lifecycle = Arc::new(KeyLifecycle::new(Arc::new(MemoryKms::new())));
        let stage = EncryptStage::new(lifecycle.clone(), storage.clone(), dir.path());
        (storage, lifecycle, stage)
    }

    fn context_with_artifact(dir: &TempDir) -> PipelineContext {
        let artifact = dir.path().join("marked.mp4");
        std::fs::write(&artifact, b"marked bytes").unwrap();
        let mut ctx = PipelineContext::new(Uuid::new_v4(), DistributionMode::Commercial);
        ctx.set_string(keys::CREATOR, WALLET);
        ctx.set_path(keys::ARTIFACT_PATH, artifact);
        ctx
    }

    #[test]
    fn test_encrypts_and_publishes_new_artifact() {
        let dir = TempDir::new().unwrap();
        let (storage, lifecycle, stage) = stage(&dir);
        storage
            .put_bytes(b"png", &format!("avatars/{}", WALLET), CONTENT_TYPE_OPAQUE)
            .unwrap();

        let mut ctx = context_with_artifact(&dir);
        stage.execute(&mut ctx).unwrap();

        let artifact = ctx.get_path(keys::ARTIFACT_PATH).unwrap();
        assert_ne!(std::fs::read(&artifact).unwrap(), b"marked bytes");

        // Decrypts back under the alias-resolved key
        let alias = ctx.get_string(keys::KEY_ALIAS).unwrap();
        let key_id = lifecycle.get_or_none(&alias).unwrap().unwrap();
        let key_bytes = lifecycle.key_material(&key_id).unwrap();
        let plain =
            AssetEncryptor::decrypt_bytes(&std::fs::read(&artifact).unwrap(), &key_bytes).unwrap();
        assert_eq!(plain, b"marked bytes");
    }

    #[test]
    fn test_missing_avatar_fails_before_key_creation() {
        let dir = TempDir::new().unwrap();
        let (_, lifecycle, stage) = stage(&dir);

        let mut ctx = context_with_artifact(&dir);
        let err = stage.execute(&mut ctx).unwrap_err();
        assert!(matches!(err, MedialockError::PreconditionFailed(_)));
        // No key was minted for the unregistered creator
        assert_eq!(
            lifecycle.get_or_none(&creator_alias(WALLET)).unwrap(),
            None
        );
    }

    #[test]
    fn test_public_mode_skips() {
        let dir = TempDir::new().unwrap();
        let (_, _, stage) = stage(&dir);
        let ctx = PipelineContext::new(Uuid::new_v4(), DistributionMode::Public);
        assert!(stage.should_skip(&ctx));
    }
}
