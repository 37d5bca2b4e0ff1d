use super::context::PipelineContext;
use super::core::{PipelineResult, PipelineStage, StageResult};
use crate::error::{MedialockError, MedialockResult};
use crate::session::SessionStore;
use std::fs;
use std::time::Instant;

/// Pipeline executor that runs stages sequentially
///
/// The executor owns the run's discipline: the deadline is checked before
/// each stage starts (an in-flight stage is never aborted), the session
/// record advances after each completed stage, and registered intermediate
/// files are removed on every exit path, including failure and timeout.
pub struct Pipeline {
    name: String,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run all stages against `context`, advancing `sessions` as they complete.
    ///
    /// `deadline`, when set, bounds the run: a stage whose start falls past it
    /// fails the run with a timeout naming that stage.
    pub fn execute(
        &self,
        context: &mut PipelineContext,
        sessions: &SessionStore,
        deadline: Option<Instant>,
    ) -> MedialockResult<PipelineResult> {
        let result = self.run_stages(context, sessions, deadline);
        self.remove_temp_files(context);

        if let Err(e) = &result {
            sessions.fail(context.session_id(), &e.to_string())?;
        }
        result
    }

    fn run_stages(
        &self,
        context: &mut PipelineContext,
        sessions: &SessionStore,
        deadline: Option<Instant>,
    ) -> MedialockResult<PipelineResult> {
        tracing::info!(
            pipeline = %self.name,
            stages = self.stages.len(),
            session = %context.session_id(),
            "starting pipeline"
        );

        let pipeline_start = Instant::now();
        let mut stage_results = Vec::new();

        for (index, stage) in self.stages.iter().enumerate() {
            let stage_name = stage.name();

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    tracing::warn!(
                        stage = stage_name,
                        session = %context.session_id(),
                        "deadline expired before stage started"
                    );
                    return Err(MedialockError::Timeout(stage_name.to_string()));
                }
            }

            if stage.should_skip(context) {
                tracing::info!(
                    stage = stage_name,
                    position = index + 1,
                    session = %context.session_id(),
                    "skipping stage"
                );
                stage_results.push(StageResult::skipped(stage_name));
                continue;
            }

            let stage_start = Instant::now();
            match stage.execute(context) {
                Ok(()) => {
                    let duration = stage_start.elapsed();
                    tracing::info!(
                        stage = stage_name,
                        position = index + 1,
                        elapsed_ms = duration.as_millis() as u64,
                        session = %context.session_id(),
                        "stage completed"
                    );
                    if let Some(state) = stage.completes() {
                        sessions.advance(context.session_id(), state)?;
                    }
                    stage_results.push(StageResult::completed(stage_name, duration));
                }
                Err(e) => {
                    tracing::error!(
                        stage = stage_name,
                        error = %e,
                        session = %context.session_id(),
                        "stage failed"
                    );
                    return Err(e);
                }
            }
        }

        let total_duration = pipeline_start.elapsed();
        tracing::info!(
            pipeline = %self.name,
            elapsed_ms = total_duration.as_millis() as u64,
            session = %context.session_id(),
            "pipeline completed"
        );

        Ok(PipelineResult {
            stage_results,
            total_duration,
        })
    }

    fn remove_temp_files(&self, context: &PipelineContext) {
        for path in context.temp_files() {
            if !path.exists() {
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed intermediate file"),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove intermediate file")
                }
            }
        }
    }
}

/// Builder for constructing pipelines
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn add_stage<S: PipelineStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            name: self.name,
            stages: self.stages,
        }
    }
}
