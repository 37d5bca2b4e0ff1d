//! In-process engine stand-in for tests and development
//!
//! Copies the input to the output byte-for-byte and reports a configured
//! duration, so pipeline behavior can be exercised without ffmpeg installed.

use super::{OverlayPass, TranscodeEngine};
use crate::error::{MedialockError, MedialockResult};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Record of one overlay invocation, for assertions
#[derive(Debug, Clone)]
pub struct OverlayCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub pass: OverlayPass,
}

pub struct MockEngine {
    duration: f64,
    fail_probe: bool,
    fail_overlay: bool,
    calls: Mutex<Vec<OverlayCall>>,
}

impl MockEngine {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            fail_probe: false,
            fail_overlay: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Engine whose duration probe always fails
    pub fn failing_probe() -> Self {
        Self {
            fail_probe: true,
            ..Self::new(0.0)
        }
    }

    /// Engine whose overlay passes always fail
    pub fn failing_overlay(duration: f64) -> Self {
        Self {
            fail_overlay: true,
            ..Self::new(duration)
        }
    }

    /// Overlay invocations seen so far
    pub fn calls(&self) -> Vec<OverlayCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl TranscodeEngine for MockEngine {
    fn probe_duration(&self, input: &Path) -> MedialockResult<f64> {
        if self.fail_probe {
            return Err(MedialockError::Probe(format!(
                "mock probe failure for {}",
                input.display()
            )));
        }
        Ok(self.duration)
    }

    fn overlay(
        &self,
        input: &Path,
        _overlay_image: &Path,
        pass: &OverlayPass,
        output: &Path,
    ) -> MedialockResult<()> {
        self.calls.lock()?.push(OverlayCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            pass: pass.clone(),
        });
        if self.fail_overlay {
            return Err(MedialockError::Composition(
                "mock overlay failure".to_string(),
            ));
        }
        std::fs::copy(input, output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TimeWindow;
    use tempfile::TempDir;

    #[test]
    fn test_mock_copies_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");
        std::fs::write(&input, b"payload").unwrap();

        let engine = MockEngine::new(10.0);
        let pass = OverlayPass::top_left(TimeWindow {
            start: 0.0,
            end: 5.0,
        });
        engine
            .overlay(&input, Path::new("wm.png"), &pass, &output)
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"payload");
        assert_eq!(engine.calls().len(), 1);
    }

    #[test]
    fn test_failing_probe() {
        let engine = MockEngine::failing_probe();
        let err = engine.probe_duration(Path::new("in.mp4")).unwrap_err();
        assert!(matches!(err, MedialockError::Probe(_)));
    }
}
