use super::keys;
use crate::error::MedialockResult;
use crate::pipeline::{PipelineContext, PipelineStage};
use crate::session::UploadState;
use crate::watermark::OverlayCompositor;
use std::path::PathBuf;

/// Runs the two-pass watermark composition
///
/// Writes `<work_dir>/<session>-composited.mp4` and registers both it and the
/// compositor's intermediate file for cleanup. The measured duration lands in
/// the context for downstream consumers.
pub struct CompositeStage {
    compositor: OverlayCompositor,
    work_dir: PathBuf,
}

impl CompositeStage {
    pub fn new(compositor: OverlayCompositor, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            compositor,
            work_dir: work_dir.into(),
        }
    }
}

impl PipelineStage for CompositeStage {
    fn execute(&self, context: &mut PipelineContext) -> MedialockResult<()> {
        let source = context.get_path(keys::SOURCE_PATH)?;
        let output = self
            .work_dir
            .join(format!("{}-composited.mp4", context.session_id()));

        // Register before running so a partial output is also cleaned up
        context.add_temp_file(output.clone());
        context.add_temp_file(OverlayCompositor::intermediate_path(&output));

        let duration = self.compositor.composite(&source, &output)?;

        context.set_number(keys::DURATION, duration);
        context.set_path(keys::COMPOSITED_PATH, output);
        Ok(())
    }

    fn name(&self) -> &str {
        "Composite Watermark"
    }

    fn completes(&self) -> Option<UploadState> {
        Some(UploadState::Composited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::session::DistributionMode;
    use std::sync::Arc;
    use tempfile::TempDir;
    use uuid::Uuid;

    #[test]
    fn test_composite_writes_output_and_duration() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, vec![0x42u8; 4096]).unwrap();

        let stage = CompositeStage::new(
            OverlayCompositor::new(Arc::new(MockEngine::new(12.0)), "wm.png"),
            dir.path(),
        );
        let mut ctx = PipelineContext::new(Uuid::new_v4(), DistributionMode::Public);
        ctx.set_path(keys::SOURCE_PATH, source);

        stage.execute(&mut ctx).unwrap();

        assert_eq!(ctx.get_number(keys::DURATION).unwrap(), 12.0);
        assert!(ctx.get_path(keys::COMPOSITED_PATH).unwrap().exists());
        // Output and intermediate are both registered for cleanup
        assert_eq!(ctx.temp_files().len(), 2);
    }

    #[test]
    fn test_composite_failure_leaves_temp_registration() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, vec![0x42u8; 4096]).unwrap();

        let stage = CompositeStage::new(
            OverlayCompositor::new(Arc::new(MockEngine::failing_overlay(6.0)), "wm.png"),
            dir.path(),
        );
        let mut ctx = PipelineContext::new(Uuid::new_v4(), DistributionMode::Public);
        ctx.set_path(keys::SOURCE_PATH, source);

        assert!(stage.execute(&mut ctx).is_err());
        assert_eq!(ctx.temp_files().len(), 2);
    }
}
