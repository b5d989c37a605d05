use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_FRAME_SKIP, DEFAULT_MAX_PENDING_DETECTIONS, DEFAULT_RATE_UPDATE_INTERVAL_MS,
    DEFAULT_SCORE_THRESHOLD, DEFAULT_TICK_INTERVAL_MS,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("frame_skip must be >= 1")]
    FrameSkip,
    #[error("score_threshold must be within 0..=1, got {0}")]
    ScoreThreshold(f64),
    #[error("rate_update_interval_ms must be > 0, got {0}")]
    RateUpdateInterval(f64),
    #[error("tick_interval_ms must be > 0")]
    TickInterval,
    #[error("max_pending_detections must be >= 1")]
    MaxPending,
}

/// Tunables for one pipeline run.
///
/// Every field is optional in the JSON file; missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Dispatch on every Nth tick.
    pub frame_skip: u64,
    pub score_threshold: f64,
    pub rate_update_interval_ms: f64,
    pub tick_interval_ms: u64,
    pub max_pending_detections: usize,
    /// Free-form hint forwarded to the detector on `init`.
    pub backend: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_skip: DEFAULT_FRAME_SKIP,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            rate_update_interval_ms: DEFAULT_RATE_UPDATE_INTERVAL_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_pending_detections: DEFAULT_MAX_PENDING_DETECTIONS,
            backend: None,
        }
    }
}

impl PipelineConfig {
    /// `<config dir>/livesight/config.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("livesight").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from [`Self::default_path`], falling back to defaults when no
    /// file exists there. A file that exists but is invalid is an error.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_skip < 1 {
            return Err(ConfigError::FrameSkip);
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(ConfigError::ScoreThreshold(self.score_threshold));
        }
        if self.rate_update_interval_ms.is_nan() || self.rate_update_interval_ms <= 0.0 {
            return Err(ConfigError::RateUpdateInterval(self.rate_update_interval_ms));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::TickInterval);
        }
        if self.max_pending_detections < 1 {
            return Err(ConfigError::MaxPending);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
