use crate::error::{MedialockError, MedialockResult};
use crate::session::DistributionMode;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Shared state container passed between pipeline stages
///
/// Stages communicate through typed accessors over a JSON value map. Paths of
/// intermediate files are registered as temp files so the executor can remove
/// them on every exit path, success and failure alike.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Session this execution belongs to
    session_id: Uuid,

    /// How the finished asset will be distributed
    mode: DistributionMode,

    /// Key-value store for stage data
    data: HashMap<String, Value>,

    /// Intermediate files removed by the executor when the run ends
    temp_files: Vec<PathBuf>,
}

impl PipelineContext {
    pub fn new(session_id: Uuid, mode: DistributionMode) -> Self {
        Self {
            session_id,
            mode,
            data: HashMap::new(),
            temp_files: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn mode(&self) -> DistributionMode {
        self.mode
    }

    /// Get a value or fail with a pipeline error naming the key.
    pub fn get_required(&self, key: &str) -> MedialockResult<&Value> {
        self.data.get(key).ok_or_else(|| {
            MedialockError::Pipeline(format!("Required context key not found: {}", key))
        })
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), Value::String(value.into()));
    }

    pub fn get_string(&self, key: &str) -> MedialockResult<String> {
        match self.get_required(key)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(MedialockError::Pipeline(format!(
                "Context key '{}' is not a string",
                key
            ))),
        }
    }

    pub fn set_path(&mut self, key: impl Into<String>, path: PathBuf) {
        self.data.insert(
            key.into(),
            Value::String(path.to_string_lossy().to_string()),
        );
    }

    pub fn get_path(&self, key: &str) -> MedialockResult<PathBuf> {
        Ok(PathBuf::from(self.get_string(key)?))
    }

    pub fn set_number(&mut self, key: impl Into<String>, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.data.insert(key.into(), Value::Number(n));
        }
    }

    pub fn get_number(&self, key: &str) -> MedialockResult<f64> {
        match self.get_required(key)? {
            Value::Number(n) => n.as_f64().ok_or_else(|| {
                MedialockError::Pipeline(format!("Context key '{}' is not a valid number", key))
            }),
            _ => Err(MedialockError::Pipeline(format!(
                "Context key '{}' is not a number",
                key
            ))),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Register an intermediate file for removal when the run ends.
    pub fn add_temp_file(&mut self, path: PathBuf) {
        self.temp_files.push(path);
    }

    pub fn temp_files(&self) -> &[PathBuf] {
        &self.temp_files
    }
}
