//! Runtime configuration.
//!
//! # Responsibility
//! - Load eligibility settings from a JSON file with per-field defaults.
//! - Validate settings before they reach services.
//!
//! # Invariants
//! - Missing fields fall back to defaults; unknown fields are rejected.
//! - `utc_offset_minutes` stays within +/-14 hours.

use crate::clock::SystemClock;
use crate::logging::default_log_level;
use crate::service::deadline_service::DEFAULT_EXPIRING_WINDOW_DAYS;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Eligibility settings shared by the CLI and embedding hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EligibilityConfig {
    /// Look-ahead for "expiring soon", in days.
    pub expiring_window_days: u32,
    /// Offset used for calendar-day boundaries.
    pub utc_offset_minutes: i32,
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<String>,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            expiring_window_days: DEFAULT_EXPIRING_WINDOW_DAYS,
            utc_offset_minutes: 0,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl EligibilityConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes must be within +/-{MAX_UTC_OFFSET_MINUTES}, got {}",
                self.utc_offset_minutes
            )));
        }
        if let Some(dir) = &self.log_dir {
            if !Path::new(dir.trim()).is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{dir}`"
                )));
            }
        }
        Ok(())
    }

    /// Returns the configured offset for day boundaries.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }

    /// Returns a system clock in the configured offset.
    pub fn clock(&self) -> Result<SystemClock, ConfigError> {
        self.utc_offset().map(SystemClock::new)
    }
}
