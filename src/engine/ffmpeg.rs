//! ffmpeg/ffprobe-backed transcoding engine

use super::{OverlayPass, TranscodeEngine};
use crate::error::{MedialockError, MedialockResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::path::Path;

/// Engine that shells out to the ffmpeg and ffprobe binaries
#[derive(Debug, Default, Clone)]
pub struct FfmpegEngine;

impl FfmpegEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TranscodeEngine for FfmpegEngine {
    fn probe_duration(&self, input: &Path) -> MedialockResult<f64> {
        tracing::debug!(input = %input.display(), "probing duration");
        let metadata = ffprobe::ffprobe(input)
            .map_err(|e| MedialockError::Probe(format!("{:?}", e)))?;

        metadata
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| {
                MedialockError::Probe(format!(
                    "no parseable duration in format metadata for {}",
                    input.display()
                ))
            })
    }

    fn overlay(
        &self,
        input: &Path,
        overlay_image: &Path,
        pass: &OverlayPass,
        output: &Path,
    ) -> MedialockResult<()> {
        let filter = pass.filter_expression();
        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            %filter,
            "running overlay pass"
        );

        let mut cmd = FfmpegCommand::new();
        cmd.input(input.to_string_lossy().as_ref())
            .input(overlay_image.to_string_lossy().as_ref())
            .args(["-filter_complex", &filter])
            .overwrite()
            .output(output.to_string_lossy().as_ref());

        let mut child = cmd
            .spawn()
            .map_err(|e| MedialockError::Composition(format!("failed to start ffmpeg: {}", e)))?;

        let mut stderr_buffer = String::new();
        let events = child.iter().map_err(|e| {
            MedialockError::Composition(format!("failed to read ffmpeg events: {}", e))
        })?;
        for event in events {
            match event {
                FfmpegEvent::Error(line) => {
                    stderr_buffer.push_str(&line);
                    stderr_buffer.push('\n');
                }
                FfmpegEvent::Log(ffmpeg_sidecar::event::LogLevel::Error, line) => {
                    stderr_buffer.push_str(&line);
                    stderr_buffer.push('\n');
                }
                _ => {}
            }
        }

        let status = child
            .wait()
            .map_err(|e| MedialockError::Composition(format!("ffmpeg did not exit: {}", e)))?;

        if !status.success() {
            let detail = if stderr_buffer.is_empty() {
                "ffmpeg exited with a failure status".to_string()
            } else {
                stderr_buffer.trim().to_string()
            };
            return Err(MedialockError::Composition(detail));
        }

        Ok(())
    }
}
