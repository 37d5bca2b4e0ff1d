//! Transcoding engine abstraction
//!
//! The overlay compositor drives an external media engine through this trait:
//! a duration probe plus a single time-windowed overlay operation. The real
//! implementation shells out to ffmpeg/ffprobe; tests substitute a mock.

pub mod ffmpeg;
pub mod mock;

pub use ffmpeg::FfmpegEngine;
pub use mock::MockEngine;

use crate::error::MedialockResult;
use std::path::Path;

/// Time window during which an overlay is enabled, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

/// One overlay pass: where the watermark sits and when it is visible.
///
/// `x`/`y` are filter-graph position expressions, so they may reference
/// `main_w`/`overlay_w` style variables.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPass {
    pub x: String,
    pub y: String,
    pub window: TimeWindow,
}

impl OverlayPass {
    /// Watermark pinned 10px off the bottom-right corner
    pub fn bottom_right(window: TimeWindow) -> Self {
        Self {
            x: "main_w-overlay_w-10".to_string(),
            y: "main_h-overlay_h-10".to_string(),
            window,
        }
    }

    /// Watermark pinned 10px off the top-left corner
    pub fn top_left(window: TimeWindow) -> Self {
        Self {
            x: "10".to_string(),
            y: "10".to_string(),
            window,
        }
    }

    /// Render this pass as an ffmpeg filter-graph expression.
    pub fn filter_expression(&self) -> String {
        format!(
            "overlay=x={}:y={}:enable='between(t,{},{})'",
            self.x, self.y, self.window.start, self.window.end
        )
    }
}

/// External media-processing engine consumed by the compositor
pub trait TranscodeEngine: Send + Sync {
    /// Measure the duration of a media file in seconds.
    fn probe_duration(&self, input: &Path) -> MedialockResult<f64>;

    /// Composite `overlay_image` onto `input` per `pass`, writing `output`.
    ///
    /// The input is never mutated; exactly one output file is produced.
    fn overlay(
        &self,
        input: &Path,
        overlay_image: &Path,
        pass: &OverlayPass,
        output: &Path,
    ) -> MedialockResult<()>;
}
