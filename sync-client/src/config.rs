//! Configuration for a sync session.
//!
//! Every field has a default matching the protocol's stock timings, so an
//! empty TOML file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use playsync_core::CheckPolicy;
use serde::Deserialize;

/// Timing and tolerance knobs for a [`SyncSession`](crate::SyncSession).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyncConfig {
    /// Debounce window for play/pause and seek publishing (default: 500ms).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Position drift tolerated before a seek correction (default: 2.0s).
    #[serde(default = "default_drift_tolerance_secs")]
    pub drift_tolerance_secs: f64,
    /// Period of the consistency check timer (default: 10s).
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Quiet time after a local seek before a CHECK may be sent (default: 10s).
    #[serde(default = "default_seek_quiet_secs")]
    pub seek_quiet_secs: u64,
    /// No CHECK is sent with this little play time left (default: 5.0s).
    #[serde(default = "default_tail_guard_secs")]
    pub tail_guard_secs: f64,
    /// How long an echo suppression token stays armed (default: 1000ms).
    #[serde(default = "default_echo_window_ms")]
    pub echo_window_ms: u64,
}

// Default value functions
fn default_debounce_ms() -> u64 {
    500
}

fn default_drift_tolerance_secs() -> f64 {
    playsync_core::DRIFT_TOLERANCE_SECS
}

fn default_check_interval_secs() -> u64 {
    10
}

fn default_seek_quiet_secs() -> u64 {
    10
}

fn default_tail_guard_secs() -> f64 {
    5.0
}

fn default_echo_window_ms() -> u64 {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            drift_tolerance_secs: default_drift_tolerance_secs(),
            check_interval_secs: default_check_interval_secs(),
            seek_quiet_secs: default_seek_quiet_secs(),
            tail_guard_secs: default_tail_guard_secs(),
            echo_window_ms: default_echo_window_ms(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable the protocol's safety margins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid("debounce_ms must be > 0".into()));
        }
        if self.check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "check_interval_secs must be > 0".into(),
            ));
        }
        if !(self.drift_tolerance_secs.is_finite() && self.drift_tolerance_secs >= 0.0) {
            return Err(ConfigError::Invalid(
                "drift_tolerance_secs must be a non-negative number".into(),
            ));
        }
        if !self.tail_guard_secs.is_finite() {
            return Err(ConfigError::Invalid(
                "tail_guard_secs must be a number".into(),
            ));
        }
        Ok(())
    }

    /// Debounce window as a duration.
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Consistency check period as a duration.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Echo token lifetime as a duration.
    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }

    /// Thresholds for the periodic check.
    pub fn check_policy(&self) -> CheckPolicy {
        CheckPolicy {
            quiet_period: Duration::from_secs(self.seek_quiet_secs),
            tail_guard_secs: self.tail_guard_secs,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}
