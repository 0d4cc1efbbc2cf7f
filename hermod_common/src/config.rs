//! Configuration loading traits and types.
//!
//! The bridge reads a single TOML file. Every section and every field has a
//! default, so an empty file yields the factory configuration.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hermod_common::config::{BridgeConfig, ConfigError, ConfigLoader};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = BridgeConfig::load(Path::new("bridge.toml"))?;
//!     config.validate()?;
//!     println!("Console: {}", config.console.address);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    BRIDGE_SERVICE_NAME, DEFAULT_CONSOLE_ADDRESS, DEFAULT_DRIVE_BAUD, DEFAULT_DRIVE_PORT,
    DEFAULT_MAX_LINE_BYTES, DEFAULT_SENSOR_BAUD, DEFAULT_SENSOR_PORT, DEFAULT_SLAVE_ADDRESS, MAX_INVERTER_FREQ_HZ,
    MAX_SYSTEM_SPEED_KMH, POLL_PERIOD_MS,
};
use crate::control::safety::SafetyThresholds;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "hermod-pod-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    BRIDGE_SERVICE_NAME.to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serial parity setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// No parity bit.
    #[default]
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
}

/// `[sensor]` - serial link to the sensor controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Serial device path.
    #[serde(default = "default_sensor_port")]
    pub port: String,
    /// Baud rate.
    #[serde(default = "default_sensor_baud")]
    pub baud_rate: u32,
    /// Read timeout; bounds how long one poll may block [ms].
    #[serde(default = "default_sensor_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Wait after opening the port before discarding stale input [ms].
    /// The controller resets when the port opens.
    #[serde(default = "default_sensor_settle_ms")]
    pub settle_ms: u64,
    /// Longer lines are dropped as malformed [bytes].
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

fn default_sensor_port() -> String {
    DEFAULT_SENSOR_PORT.to_string()
}
fn default_sensor_baud() -> u32 {
    DEFAULT_SENSOR_BAUD
}
fn default_sensor_read_timeout_ms() -> u64 {
    1000
}
fn default_sensor_settle_ms() -> u64 {
    2000
}
fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port: default_sensor_port(),
            baud_rate: default_sensor_baud(),
            read_timeout_ms: default_sensor_read_timeout_ms(),
            settle_ms: default_sensor_settle_ms(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

/// `[drive]` - RS-485 link to the inverter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Serial device path of the RS-485 transceiver.
    #[serde(default = "default_drive_port")]
    pub port: String,
    /// Baud rate (inverter H5-02).
    #[serde(default = "default_drive_baud")]
    pub baud_rate: u32,
    /// Parity (inverter H5-03).
    #[serde(default = "default_drive_parity")]
    pub parity: Parity,
    /// Modbus slave address (inverter H5-01).
    #[serde(default = "default_slave_address")]
    pub slave_address: u8,
    /// Write timeout [ms].
    #[serde(default = "default_drive_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

fn default_drive_port() -> String {
    DEFAULT_DRIVE_PORT.to_string()
}
fn default_drive_baud() -> u32 {
    DEFAULT_DRIVE_BAUD
}
fn default_drive_parity() -> Parity {
    Parity::Even
}
fn default_slave_address() -> u8 {
    DEFAULT_SLAVE_ADDRESS
}
fn default_drive_write_timeout_ms() -> u64 {
    100
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            port: default_drive_port(),
            baud_rate: default_drive_baud(),
            parity: default_drive_parity(),
            slave_address: default_slave_address(),
            write_timeout_ms: default_drive_write_timeout_ms(),
        }
    }
}

/// `[console]` - TCP link to the operator console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// `host:port` of the console server.
    #[serde(default = "default_console_address")]
    pub address: String,
    /// Read timeout; bounds how long the command thread waits before
    /// re-checking the shutdown flag [ms].
    #[serde(default = "default_console_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Longer command lines are dropped [bytes].
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

fn default_console_address() -> String {
    DEFAULT_CONSOLE_ADDRESS.to_string()
}
fn default_console_read_timeout_ms() -> u64 {
    200
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            address: default_console_address(),
            read_timeout_ms: default_console_read_timeout_ms(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

/// `[limits]` - physical scaling between wheel speed and drive frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Wheel speed at maximum inverter frequency [km/h].
    #[serde(default = "default_max_system_speed")]
    pub max_system_speed_kmh: f64,
    /// Maximum inverter frequency [Hz].
    #[serde(default = "default_max_inverter_freq")]
    pub max_inverter_freq_hz: f64,
}

fn default_max_system_speed() -> f64 {
    MAX_SYSTEM_SPEED_KMH
}
fn default_max_inverter_freq() -> f64 {
    MAX_INVERTER_FREQ_HZ
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_system_speed_kmh: default_max_system_speed(),
            max_inverter_freq_hz: default_max_inverter_freq(),
        }
    }
}

/// `[engine]` - control loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Telemetry poll period [ms].
    #[serde(default = "default_poll_period_ms")]
    pub poll_period_ms: u64,
}

fn default_poll_period_ms() -> u64 {
    POLL_PERIOD_MS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: default_poll_period_ms(),
        }
    }
}

impl EngineConfig {
    /// Poll period as a `Duration`.
    #[inline]
    pub const fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// `[shared]`
    #[serde(default)]
    pub shared: SharedConfig,
    /// `[sensor]`
    #[serde(default)]
    pub sensor: SensorConfig,
    /// `[drive]`
    #[serde(default)]
    pub drive: DriveConfig,
    /// `[console]`
    #[serde(default)]
    pub console: ConsoleConfig,
    /// `[limits]`
    #[serde(default)]
    pub limits: LimitsConfig,
    /// `[safety]`
    #[serde(default)]
    pub safety: SafetyThresholds,
    /// `[engine]`
    #[serde(default)]
    pub engine: EngineConfig,
}

impl BridgeConfig {
    /// Validate the bridge configuration.
    ///
    /// # Validation Rules
    /// 1. `shared.service_name` non-empty
    /// 2. Serial ports and console address non-empty, baud rates > 0
    /// 3. `drive.slave_address` in 1..=247 (Modbus unicast range)
    /// 4. Limits finite and > 0
    /// 5. Safety thresholds valid
    /// 6. `engine.poll_period_ms` > 0
    /// 7. `max_line_bytes` > 0 on the sensor and console links
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.sensor.port.is_empty() {
            return Err(ConfigError::ValidationError(
                "sensor.port cannot be empty".to_string(),
            ));
        }
        if self.sensor.baud_rate == 0 {
            return Err(ConfigError::ValidationError(
                "sensor.baud_rate must be greater than 0".to_string(),
            ));
        }

        if self.drive.port.is_empty() {
            return Err(ConfigError::ValidationError(
                "drive.port cannot be empty".to_string(),
            ));
        }
        if self.drive.baud_rate == 0 {
            return Err(ConfigError::ValidationError(
                "drive.baud_rate must be greater than 0".to_string(),
            ));
        }
        if !(1..=247).contains(&self.drive.slave_address) {
            return Err(ConfigError::ValidationError(format!(
                "drive.slave_address must be in 1..=247 (got {})",
                self.drive.slave_address
            )));
        }

        if self.console.address.is_empty() {
            return Err(ConfigError::ValidationError(
                "console.address cannot be empty".to_string(),
            ));
        }

        let limits = [
            ("max_system_speed_kmh", self.limits.max_system_speed_kmh),
            ("max_inverter_freq_hz", self.limits.max_inverter_freq_hz),
        ];
        for (name, value) in limits {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "limits.{name} must be finite and greater than 0 (got {value})"
                )));
            }
        }

        self.safety.validate()?;

        if self.engine.poll_period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "engine.poll_period_ms must be greater than 0".to_string(),
            ));
        }

        for (section, max) in [
            ("sensor", self.sensor.max_line_bytes),
            ("console", self.console.max_line_bytes),
        ] {
            if max == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{section}.max_line_bytes must be greater than 0"
                )));
            }
        }

        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
