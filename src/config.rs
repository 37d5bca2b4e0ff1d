//! Pipeline configuration
//!
//! Settings that the surrounding backend injects once at startup: where the
//! watermark image lives, where intermediate files are written, and how long
//! presigned retrieval URLs stay valid.

use crate::error::{MedialockError, MedialockResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default presign TTL, in seconds
const DEFAULT_PRESIGN_TTL_SECS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Watermark image stamped by the overlay compositor
    pub watermark_path: PathBuf,

    /// Directory for per-session intermediate files
    pub work_dir: PathBuf,

    /// Validity window for presigned retrieval URLs
    #[serde(with = "ttl_secs")]
    pub presign_ttl: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            watermark_path: PathBuf::from("public/watermark.png"),
            work_dir: std::env::temp_dir(),
            presign_ttl: Duration::from_secs(DEFAULT_PRESIGN_TTL_SECS),
        }
    }
}

impl PipelineConfig {
    /// Build a config from defaults plus `MEDIALOCK_*` environment overrides.
    pub fn from_env() -> MedialockResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("MEDIALOCK_WATERMARK") {
            config.watermark_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("MEDIALOCK_WORK_DIR") {
            config.work_dir = PathBuf::from(dir);
        }
        if let Ok(secs) = std::env::var("MEDIALOCK_PRESIGN_TTL_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                MedialockError::ConfigError(format!(
                    "MEDIALOCK_PRESIGN_TTL_SECS is not a number: {}",
                    secs
                ))
            })?;
            config.presign_ttl = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MedialockResult<()> {
        if self.presign_ttl.is_zero() {
            return Err(MedialockError::ConfigError(
                "presign TTL must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_watermark(mut self, path: impl Into<PathBuf>) -> Self {
        self.watermark_path = path.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_presign_ttl(mut self, ttl: Duration) -> Self {
        self.presign_ttl = ttl;
        self
    }
}

mod ttl_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl() {
        let config = PipelineConfig::default();
        assert_eq!(config.presign_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::default()
            .with_watermark("/assets/wm.png")
            .with_presign_ttl(Duration::from_secs(60));
        assert_eq!(config.watermark_path, PathBuf::from("/assets/wm.png"));
        assert_eq!(config.presign_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = PipelineConfig::default().with_presign_ttl(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.presign_ttl, config.presign_ttl);
    }
}
