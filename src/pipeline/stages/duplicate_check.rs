use super::keys;
use crate::error::{MedialockError, MedialockResult};
use crate::pipeline::{PipelineContext, PipelineStage};
use crate::provenance;
use crate::session::UploadState;

/// Rejects sources that already carry an attribution marker
///
/// A marked source means the bytes were already processed by this pipeline
/// (or copied from an asset that was), so re-protecting them would stamp a
/// second creator over the first.
pub struct DuplicateCheckStage;

impl PipelineStage for DuplicateCheckStage {
    fn execute(&self, context: &mut PipelineContext) -> MedialockResult<()> {
        let source = context.get_path(keys::SOURCE_PATH)?;

        if let Some(existing) = provenance::extract_file(&source)? {
            tracing::warn!(
                session = %context.session_id(),
                attributed_to = %existing,
                "rejecting already-marked source"
            );
            return Err(MedialockError::DuplicateSource);
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "Check Duplicate"
    }

    fn completes(&self) -> Option<UploadState> {
        Some(UploadState::DuplicateChecked)
    }
}
