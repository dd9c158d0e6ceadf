//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/habitflow/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/habitflow/` (~/.config/habitflow/)
//! - Data: `$XDG_DATA_HOME/habitflow/` (~/.local/share/habitflow/)
//! - State/Logs: `$XDG_STATE_HOME/habitflow/` (~/.local/state/habitflow/)

use crate::analytics::correlation::CorrelationConfig;
use crate::analytics::prediction::PredictionConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Analytics tuning
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Storage overrides
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Analytics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Look-back window of the current streak, in days
    #[serde(default = "default_streak_window_days")]
    pub streak_window_days: i64,

    /// Days covered by the completion heatmap
    #[serde(default = "default_heatmap_days")]
    pub heatmap_days: u32,

    #[serde(default)]
    pub correlation: CorrelationConfig,

    #[serde(default)]
    pub prediction: PredictionConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            streak_window_days: default_streak_window_days(),
            heatmap_days: default_heatmap_days(),
            correlation: CorrelationConfig::default(),
            prediction: PredictionConfig::default(),
        }
    }
}

fn default_streak_window_days() -> i64 {
    30
}

fn default_heatmap_days() -> u32 {
    365
}

impl AnalyticsConfig {
    /// Reject inconsistent tuning values.
    pub fn validate(&self) -> Result<()> {
        if self.streak_window_days < 0 {
            return Err(Error::Config(
                "analytics.streak_window_days must not be negative".to_string(),
            ));
        }
        if self.heatmap_days == 0 {
            return Err(Error::Config(
                "analytics.heatmap_days must be at least 1".to_string(),
            ));
        }

        let c = &self.correlation;
        let w = &c.weights;
        if [w.completion, w.timing, w.performance, w.context]
            .iter()
            .any(|v| *v < 0.0)
        {
            return Err(Error::Config(
                "analytics.correlation.weights must not be negative".to_string(),
            ));
        }
        if (w.sum() - 1.0).abs() > 1e-6 {
            return Err(Error::Config(format!(
                "analytics.correlation.weights must sum to 1.0, got {}",
                w.sum()
            )));
        }
        for (name, value) in [
            ("correlation.min_score", c.min_score),
            ("correlation.min_confidence", c.min_confidence),
            ("correlation.dependency_threshold", c.dependency_threshold),
            ("correlation.dependency_kind_threshold", c.dependency_kind_threshold),
            ("correlation.recommendation_threshold", c.recommendation_threshold),
            ("prediction.confidence_baseline", self.prediction.confidence_baseline),
            ("prediction.optimal_min_rate", self.prediction.optimal_min_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "analytics.{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if c.confidence_sample_size == 0 {
            return Err(Error::Config(
                "analytics.correlation.confidence_sample_size must be at least 1".to_string(),
            ));
        }
        if c.same_time_minutes < 0 || c.sequential_minutes < c.same_time_minutes {
            return Err(Error::Config(
                "analytics.correlation requires 0 <= same_time_minutes <= sequential_minutes"
                    .to_string(),
            ));
        }
        if c.overview_window_days < 0 {
            return Err(Error::Config(
                "analytics.correlation.overview_window_days must not be negative".to_string(),
            ));
        }
        let p = &self.prediction;
        for (name, value) in [
            ("min_success_entries", p.min_success_entries),
            ("min_timing_entries", p.min_timing_entries),
            ("min_difficulty_entries", p.min_difficulty_entries),
        ] {
            if value == 0 {
                return Err(Error::Config(format!(
                    "analytics.prediction.{name} must be at least 1"
                )));
            }
        }
        if self.prediction.recent_window_days <= 0 {
            return Err(Error::Config(
                "analytics.prediction.recent_window_days must be at least 1".to_string(),
            ));
        }
        if self.prediction.recency_falloff < 0.0 {
            return Err(Error::Config(
                "analytics.prediction.recency_falloff must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the SQLite database location
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.analytics.validate()
    }

    /// The database this configuration points at: the `[storage]` override
    /// or the XDG default.
    pub fn resolved_database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(Self::database_path)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/habitflow/config.toml` (~/.config/habitflow/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("habitflow").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/habitflow/` (~/.local/share/habitflow/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("habitflow")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/habitflow/` (~/.local/state/habitflow/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("habitflow")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/habitflow/habits.db` (~/.local/share/habitflow/habits.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("habits.db")
    }
}
