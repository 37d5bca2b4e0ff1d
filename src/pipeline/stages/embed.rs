use super::keys;
use crate::error::MedialockResult;
use crate::pipeline::{PipelineContext, PipelineStage};
use crate::provenance;
use crate::session::UploadState;
use std::path::PathBuf;

/// Embeds the creator's wallet address as the provenance marker
///
/// Writes `<work_dir>/<session>-marked.mp4` and publishes it as the current
/// artifact; the encrypt stage replaces the artifact for commercial uploads.
pub struct EmbedStage {
    work_dir: PathBuf,
}

impl EmbedStage {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }
}

impl PipelineStage for EmbedStage {
    fn execute(&self, context: &mut PipelineContext) -> MedialockResult<()> {
        let composited = context.get_path(keys::COMPOSITED_PATH)?;
        let creator = context.get_string(keys::CREATOR)?;
        let output = self
            .work_dir
            .join(format!("{}-marked.mp4", context.session_id()));

        context.add_temp_file(output.clone());
        provenance::embed_file(&composited, &output, &creator)?;

        context.set_path(keys::MARKED_PATH, output.clone());
        context.set_path(keys::ARTIFACT_PATH, output);
        Ok(())
    }

    fn name(&self) -> &str {
        "Embed Provenance"
    }

    fn completes(&self) -> Option<UploadState> {
        Some(UploadState::Marked)
    }
}
