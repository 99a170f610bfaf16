//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//! Every section and every field is optional; missing values fall back to
//! the defaults below.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, TelemetryError};
use crate::presenter::backend::View;
use crate::presenter::units::Units;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub presenter: PresenterConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logger identity and sampling rate
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default = "default_device_name")]
    pub name: String,

    #[serde(default)]
    pub units: Units,

    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: u32,
}

/// Sample source configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Fixed seed for reproducible synthetic data
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_stale_timeout_ms")]
    pub stale_timeout_ms: u64,
}

/// Render cadence per view
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PresenterConfig {
    #[serde(default = "default_gauge_interval_ms")]
    pub gauge_interval_ms: u64,

    #[serde(default = "default_gforce_frame_rate_hz")]
    pub gforce_frame_rate_hz: u32,

    #[serde(default = "default_gps_interval_ms")]
    pub gps_interval_ms: u64,

    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,

    #[serde(default = "default_initial_view")]
    pub initial_view: View,
}

/// Session recording configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RecordingConfig {
    /// Start a session as soon as the logger is up
    #[serde(default)]
    pub auto_record: bool,

    #[serde(default)]
    pub session_name: Option<String>,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily log files; empty disables file logging
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_device_name() -> String { "OpenPonyLogger-01".to_string() }
fn default_sample_rate_hz() -> u32 { 10 }

fn default_stale_timeout_ms() -> u64 { 2000 }

fn default_gauge_interval_ms() -> u64 { 500 }
fn default_gforce_frame_rate_hz() -> u32 { 60 }
fn default_gps_interval_ms() -> u64 { 1000 }
fn default_status_interval_ms() -> u64 { 2000 }
fn default_initial_view() -> View { View::Gauges }

fn default_log_level() -> String { "info".to_string() }

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            units: Units::default(),
            sample_rate_hz: default_sample_rate_hz(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            seed: None,
            stale_timeout_ms: default_stale_timeout_ms(),
        }
    }
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            gauge_interval_ms: default_gauge_interval_ms(),
            gforce_frame_rate_hz: default_gforce_frame_rate_hz(),
            gps_interval_ms: default_gps_interval_ms(),
            status_interval_ms: default_status_interval_ms(),
            initial_view: default_initial_view(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Config(toml::de::Error::custom(msg))
}

fn check_range<T>(name: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(invalid(format!("{} must be between {} and {}", name, min, max)));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pony_telemetry::config::Config;
    ///
    /// let config = Config::load("pony-telemetry.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.device.name.trim().is_empty() {
            return Err(invalid("device name cannot be empty"));
        }

        check_range("sample_rate_hz", self.device.sample_rate_hz, 1, 1000)?;
        check_range("stale_timeout_ms", self.source.stale_timeout_ms, 1, 60000)?;

        for (name, value) in [
            ("gauge_interval_ms", self.presenter.gauge_interval_ms),
            ("gps_interval_ms", self.presenter.gps_interval_ms),
            ("status_interval_ms", self.presenter.status_interval_ms),
        ] {
            check_range(name, value, 1, 60000)?;
        }

        check_range("gforce_frame_rate_hz", self.presenter.gforce_frame_rate_hz, 1, 240)?;

        if let Some(name) = &self.recording.session_name {
            if name.trim().is_empty() {
                return Err(invalid("session_name cannot be blank"));
            }
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}
