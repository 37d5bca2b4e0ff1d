//! Overlay compositor
//!
//! Stamps the watermark image onto a source video in two passes driven by the
//! measured duration: bottom-right for the first half, top-left for the
//! second. The duration probe runs first and is fatal on failure; without a
//! measured duration there are no safe time windows.

use crate::engine::{OverlayPass, TimeWindow, TranscodeEngine};
use crate::error::MedialockResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct OverlayCompositor {
    engine: Arc<dyn TranscodeEngine>,
    watermark: PathBuf,
}

impl OverlayCompositor {
    pub fn new(engine: Arc<dyn TranscodeEngine>, watermark: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            watermark: watermark.into(),
        }
    }

    /// Path of the intermediate file the compositor writes between passes.
    ///
    /// Exposed so the orchestrator can register it for error-path cleanup;
    /// on normal completion the compositor removes it itself.
    pub fn intermediate_path(output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_os_string();
        name.push(".pass1");
        PathBuf::from(name)
    }

    /// Composite the watermark onto `input`, writing `output`.
    ///
    /// The input is never mutated. Exactly one output file survives on
    /// success; partial outputs on the error path are the caller's to remove.
    pub fn composite(&self, input: &Path, output: &Path) -> MedialockResult<f64> {
        let duration = self.engine.probe_duration(input)?;
        let half = duration / 2.0;
        tracing::info!(
            input = %input.display(),
            duration,
            "compositing watermark in two passes"
        );

        let intermediate = Self::intermediate_path(output);

        self.engine.overlay(
            input,
            &self.watermark,
            &OverlayPass::bottom_right(TimeWindow {
                start: 0.0,
                end: half,
            }),
            &intermediate,
        )?;

        self.engine.overlay(
            &intermediate,
            &self.watermark,
            &OverlayPass::top_left(TimeWindow {
                start: half,
                end: duration,
            }),
            output,
        )?;

        // Own intermediate artifact is removed on normal completion of the
        // second pass; failure to remove it is not fatal.
        if let Err(e) = std::fs::remove_file(&intermediate) {
            tracing::warn!(
                path = %intermediate.display(),
                error = %e,
                "failed to remove intermediate overlay file"
            );
        }

        Ok(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::error::MedialockError;
    use tempfile::TempDir;

    #[test]
    fn test_two_pass_schedule() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");
        std::fs::write(&input, b"source bytes").unwrap();

        let engine = Arc::new(MockEngine::new(10.0));
        let compositor = OverlayCompositor::new(engine.clone(), "wm.png");
        let duration = compositor.composite(&input, &output).unwrap();

        assert_eq!(duration, 10.0);
        assert!(output.exists());

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].pass.window, TimeWindow { start: 0.0, end: 5.0 });
        assert_eq!(calls[0].pass.x, "main_w-overlay_w-10");
        assert_eq!(
            calls[1].pass.window,
            TimeWindow {
                start: 5.0,
                end: 10.0
            }
        );
        assert_eq!(calls[1].pass.x, "10");
        // Second pass reads the first pass's output
        assert_eq!(calls[1].input, calls[0].output);
    }

    #[test]
    fn test_intermediate_removed_on_success() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");
        std::fs::write(&input, b"source bytes").unwrap();

        let compositor = OverlayCompositor::new(Arc::new(MockEngine::new(8.0)), "wm.png");
        compositor.composite(&input, &output).unwrap();

        assert!(!OverlayCompositor::intermediate_path(&output).exists());
    }

    #[test]
    fn test_probe_failure_is_fatal_before_any_pass() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");
        std::fs::write(&input, b"source bytes").unwrap();

        let engine = Arc::new(MockEngine::failing_probe());
        let compositor = OverlayCompositor::new(engine.clone(), "wm.png");
        let err = compositor.composite(&input, &output).unwrap_err();

        assert!(matches!(err, MedialockError::Probe(_)));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_overlay_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");
        std::fs::write(&input, b"source bytes").unwrap();

        let compositor =
            OverlayCompositor::new(Arc::new(MockEngine::failing_overlay(6.0)), "wm.png");
        let err = compositor.composite(&input, &output).unwrap_err();
        assert!(matches!(err, MedialockError::Composition(_)));
    }

    #[test]
    fn test_input_never_mutated() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");
        std::fs::write(&input, b"source bytes").unwrap();

        let compositor = OverlayCompositor::new(Arc::new(MockEngine::new(4.0)), "wm.png");
        compositor.composite(&input, &output).unwrap();
        assert_eq!(std::fs::read(&input).unwrap(), b"source bytes");
    }
}
