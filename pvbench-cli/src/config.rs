//! Configuration loading from pvbench.toml
//!
//! pvbench configuration can be specified in a `pvbench.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use pvbench_core::{
    DEFAULT_MAX_TIME_NS, DEFAULT_MIN_SAMPLES, DEFAULT_SAMPLE_WINDOW_NS, DEFAULT_TARGET_RME,
    DEFAULT_WORKLOAD_LEN, SamplerConfig, SamplerConfigError,
};
use pvbench_stats::{ConfidenceLevel, StatsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for by [`PvbenchConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "pvbench.toml";

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// A duration string could not be parsed
    #[error("invalid duration {0:?}: expected a number followed by ns, us, ms, s or m")]
    InvalidDuration(String),

    /// The confidence level has no critical-value table
    #[error(transparent)]
    Confidence(#[from] StatsError),

    /// The sampler settings are unusable
    #[error(transparent)]
    Sampler(#[from] SamplerConfigError),

    /// Unknown output format name
    #[error("{0}")]
    Format(String),
}

/// pvbench configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PvbenchConfig {
    /// Workload configuration
    #[serde(default)]
    pub workload: WorkloadConfig,
    /// Convergence configuration
    #[serde(default)]
    pub sampler: SamplerSection,
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Workload configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Pushes per invocation
    #[serde(default = "default_len")]
    pub len: u32,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self { len: default_len() }
    }
}

fn default_len() -> u32 {
    DEFAULT_WORKLOAD_LEN
}

/// Sampler configuration as written in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerSection {
    /// Duration of one sample (e.g., "50ms")
    #[serde(default = "default_sample_window")]
    pub sample_window: String,
    /// Minimum samples before convergence is accepted
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Relative margin of error target, percent
    #[serde(default = "default_target_rme")]
    pub target_rme: f64,
    /// Per-case time budget (e.g., "5s")
    #[serde(default = "default_max_time")]
    pub max_time: String,
    /// Confidence level: 0.90, 0.95 or 0.99
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

impl Default for SamplerSection {
    fn default() -> Self {
        Self {
            sample_window: default_sample_window(),
            min_samples: default_min_samples(),
            target_rme: default_target_rme(),
            max_time: default_max_time(),
            confidence_level: default_confidence_level(),
        }
    }
}

fn default_sample_window() -> String {
    format!("{}ms", DEFAULT_SAMPLE_WINDOW_NS / 1_000_000)
}
fn default_min_samples() -> usize {
    DEFAULT_MIN_SAMPLES
}
fn default_target_rme() -> f64 {
    DEFAULT_TARGET_RME
}
fn default_max_time() -> String {
    format!("{}s", DEFAULT_MAX_TIME_NS / 1_000_000_000)
}
fn default_confidence_level() -> f64 {
    pvbench_stats::DEFAULT_CONFIDENCE_LEVEL
}

/// Runner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Pin the measuring thread to this CPU
    #[serde(default)]
    pub pin_cpu: Option<usize>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl PvbenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find and load the nearest `pvbench.toml` at or above `start`
    pub fn discover_from(start: impl Into<PathBuf>) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let mut dir = start.into();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                let config = Self::load(&config_path)?;
                return Ok(Some((config_path, config)));
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Result<Option<(PathBuf, Self)>, ConfigError> {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(dir),
            Err(_) => Ok(None),
        }
    }

    /// Sampler settings from the `[sampler]` section, validated
    pub fn sampler_config(&self) -> Result<SamplerConfig, ConfigError> {
        let config = SamplerConfig {
            sample_window_ns: parse_duration(&self.sampler.sample_window)?,
            min_samples: self.sampler.min_samples,
            target_rme: self.sampler.target_rme,
            max_time_ns: parse_duration(&self.sampler.max_time)?,
            confidence_level: ConfidenceLevel::try_from(self.sampler.confidence_level)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# pvbench Configuration

[workload]
# Elements pushed per invocation
len = 1000

[sampler]
# Target duration of one sample
sample_window = "50ms"
# Minimum samples before the margin target can stop sampling
min_samples = 5
# Relative margin of error target, percent
target_rme = 1.0
# Per-case time budget; cases that run out are flagged low-confidence
max_time = "5s"
# Confidence level: 0.90, 0.95 or 0.99
confidence_level = 0.95

[runner]
# Pin the measuring thread to a CPU (uncomment to enable, Linux only)
# pin_cpu = 0

[output]
# Default output format: human, json
format = "human"
"#
        .to_string()
    }
}

/// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds
pub fn parse_duration(s: &str) -> Result<u64, ConfigError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ConfigError::InvalidDuration(s.to_string()));
    }

    // Find where the number ends and unit begins
    let (num_part, unit_part) = s
        .char_indices()
        .find(|(_, c)| c.is_alphabetic())
        .map(|(i, _)| s.split_at(i))
        .unwrap_or((s, "s"));

    let value: f64 = num_part
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidDuration(s.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidDuration(s.to_string()));
    }

    let multiplier: u64 = match unit_part.to_lowercase().as_str() {
        "ns" => 1,
        "us" | "µs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" | "min" => 60_000_000_000,
        _ => return Err(ConfigError::InvalidDuration(s.to_string())),
    };

    Ok((value * multiplier as f64) as u64)
}
