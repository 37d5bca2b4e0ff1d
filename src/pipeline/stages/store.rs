use super::keys;
use crate::error::MedialockResult;
use crate::pipeline::{PipelineContext, PipelineStage};
use crate::session::{DistributionMode, UploadState};
use crate::storage::{StorageDispatcher, CONTENT_TYPE_OPAQUE, CONTENT_TYPE_VIDEO};
use std::fs;
use std::sync::Arc;

/// Uploads the finished artifact to object storage
///
/// Public artifacts are content-addressed under `content/<sha256>` and served
/// as video; commercial ciphertext lands under a creator-scoped session key
/// and is served opaque. The commercial key is provisional until mint renames
/// it into the token namespace.
pub struct StoreStage {
    storage: Arc<StorageDispatcher>,
}

impl StoreStage {
    pub fn new(storage: Arc<StorageDispatcher>) -> Self {
        Self { storage }
    }
}

impl PipelineStage for StoreStage {
    fn execute(&self, context: &mut PipelineContext) -> MedialockResult<()> {
        let artifact = context.get_path(keys::ARTIFACT_PATH)?;
        let bytes = fs::read(&artifact)?;

        let (object_key, content_type) = match context.mode() {
            DistributionMode::Public => (
                format!("content/{}", StorageDispatcher::content_address(&bytes)),
                CONTENT_TYPE_VIDEO,
            ),
            DistributionMode::Commercial => {
                let creator = context.get_string(keys::CREATOR)?;
                (
                    format!("creator/{}/{}", creator, context.session_id()),
                    CONTENT_TYPE_OPAQUE,
                )
            }
        };

        self.storage.put_bytes(&bytes, &object_key, content_type)?;

        if context.mode() == DistributionMode::Public {
            let locator = self.storage.presign(&object_key)?;
            context.set_string(keys::LOCATOR, locator.to_string());
        }
        context.set_string(keys::OBJECT_KEY, object_key);
        Ok(())
    }

    fn name(&self) -> &str {
        "Store Asset"
    }

    fn completes(&self) -> Option<UploadState> {
        Some(UploadState::Stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    const WALLET: &str = "0xaa01aa01aa01aa01aa01aa01aa01aa01aa01aa01";

    fn stage() -> (Arc<StorageDispatcher>, StoreStage) {
        let storage = Arc::new(StorageDispatcher::new(
            Arc::new(MemoryObjectStore::new()),
            Duration::from_secs(600),
        ));
        (storage.clone(), StoreStage::new(storage))
    }

    #[test]
    fn test_public_artifact_is_content_addressed() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("marked.mp4");
        std::fs::write(&artifact, b"marked bytes").unwrap();

        let (storage, stage) = stage();
        let mut ctx = PipelineContext::new(Uuid::new_v4(), DistributionMode::Public);
        ctx.set_path(keys::ARTIFACT_PATH, artifact);

        stage.execute(&mut ctx).unwrap();

        let object_key = ctx.get_string(keys::OBJECT_KEY).unwrap();
        let expected = format!(
            "content/{}",
            StorageDispatcher::content_address(b"marked bytes")
        );
        assert_eq!(object_key, expected);
        assert_eq!(storage.get(&object_key).unwrap(), b"marked bytes");
        assert!(ctx.get_string(keys::LOCATOR).unwrap().contains(&expected));
    }

    #[test]
    fn test_commercial_artifact_is_creator_scoped() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("encrypted.bin");
        std::fs::write(&artifact, b"ciphertext").unwrap();

        let (storage, stage) = stage();
        let session_id = Uuid::new_v4();
        let mut ctx = PipelineContext::new(session_id, DistributionMode::Commercial);
        ctx.set_string(keys::CREATOR, WALLET);
        ctx.set_path(keys::ARTIFACT_PATH, artifact);

        stage.execute(&mut ctx).unwrap();

        let object_key = ctx.get_string(keys::OBJECT_KEY).unwrap();
        assert_eq!(object_key, format!("creator/{}/{}", WALLET, session_id));
        assert!(storage.exists(&object_key).unwrap());
        // No public locator for ciphertext
        assert!(!ctx.has(keys::LOCATOR));
    }
}
