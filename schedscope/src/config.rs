//! Configuration for ingestion and bottleneck detection
//!
//! Every rule threshold is a policy constant rather than something derived
//! from the trace, so all of them are exposed here. A TOML file may override
//! any subset:
//!
//! ```toml
//! [pipeline]
//! workers = 8
//!
//! [analysis]
//! lock_percent = 20.0
//! starvation_ratio = 0.8
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::thread;

use crate::domain::ConfigError;

/// Default bounded queue size per shard worker
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default size of the most-blocked ranking
pub const DEFAULT_TOP_N: usize = 10;

/// Number of shard workers to use when not configured: the available
/// parallelism, or 1 if it cannot be determined.
#[must_use]
pub fn default_worker_count() -> usize {
    thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load and validate a TOML config file. Missing keys take defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or a value is
    /// out of range.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: Config = toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.analysis.validate()?;
        Ok(config)
    }
}

/// Shard worker pool sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { workers: default_worker_count(), queue_capacity: DEFAULT_QUEUE_CAPACITY }
    }
}

/// Thresholds for the bottleneck rules
///
/// Percent thresholds are shares of total blocked time (0.0 - 100.0); a rule
/// fires when the observed share is strictly greater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub channel_receive_percent: f64,
    pub channel_send_percent: f64,
    pub lock_percent: f64,
    pub gc_percent: f64,
    /// Share of all blocked time held by the single most-blocked task
    pub dominant_task_percent: f64,
    /// `runnable / (runnable + running)` above which a task is starving (0.0 - 1.0)
    pub starvation_ratio: f64,
    pub top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            channel_receive_percent: 40.0,
            channel_send_percent: 40.0,
            lock_percent: 30.0,
            gc_percent: 15.0,
            dominant_task_percent: 50.0,
            starvation_ratio: 0.7,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration
    ///
    /// # Errors
    /// Returns the first out-of-range threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let percents = [
            ("channel_receive_percent", self.channel_receive_percent),
            ("channel_send_percent", self.channel_send_percent),
            ("lock_percent", self.lock_percent),
            ("gc_percent", self.gc_percent),
            ("dominant_task_percent", self.dominant_task_percent),
        ];
        for (name, value) in percents {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold {
                    name,
                    value,
                    expected: "a percentage in [0, 100]",
                });
            }
        }

        if !(0.0..=1.0).contains(&self.starvation_ratio) {
            return Err(ConfigError::InvalidThreshold {
                name: "starvation_ratio",
                value: self.starvation_ratio,
                expected: "a ratio in [0, 1]",
            });
        }

        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }

        Ok(())
    }
}
