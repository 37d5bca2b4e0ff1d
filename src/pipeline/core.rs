use super::context::PipelineContext;
use crate::error::MedialockResult;
use crate::session::UploadState;
use std::time::Duration;

/// A single stage in the upload pipeline
///
/// Stages run sequentially and communicate through the context. A stage that
/// fails stops the pipeline with a typed error; the executor records the
/// failure on the session and cleans up intermediates.
pub trait PipelineStage: Send + Sync {
    fn execute(&self, context: &mut PipelineContext) -> MedialockResult<()>;

    /// Stage name for logging and timeout errors
    fn name(&self) -> &str;

    /// Session state the session advances to after this stage succeeds
    fn completes(&self) -> Option<UploadState> {
        None
    }

    /// Whether to skip this stage for the given context
    ///
    /// Used for optional stages (encryption only applies to commercial mode).
    fn should_skip(&self, _context: &PipelineContext) -> bool {
        false
    }
}

/// Outcome of a single stage
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage_name: String,
    pub duration: Duration,
    pub skipped: bool,
}

impl StageResult {
    pub fn completed(stage_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            stage_name: stage_name.into(),
            duration,
            skipped: false,
        }
    }

    pub fn skipped(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            duration: Duration::from_secs(0),
            skipped: true,
        }
    }
}

/// Outcome of a full pipeline run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub stage_results: Vec<StageResult>,
    pub total_duration: Duration,
}

impl PipelineResult {
    pub fn executed_stages(&self) -> usize {
        self.stage_results.iter().filter(|r| !r.skipped).count()
    }

    pub fn skipped_stages(&self) -> usize {
        self.stage_results.iter().filter(|r| r.skipped).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_result_skipped_has_zero_duration() {
        let result = StageResult::skipped("Encrypt Asset");
        assert!(result.skipped);
        assert_eq!(result.duration, Duration::from_secs(0));
    }

    #[test]
    fn test_pipeline_result_counts() {
        let result = PipelineResult {
            stage_results: vec![
                StageResult::completed("Check Duplicate", Duration::from_millis(5)),
                StageResult::skipped("Encrypt Asset"),
                StageResult::completed("Store Asset", Duration::from_millis(10)),
            ],
            total_duration: Duration::from_millis(15),
        };
        assert_eq!(result.executed_stages(), 2);
        assert_eq!(result.skipped_stages(), 1);
    }
}
