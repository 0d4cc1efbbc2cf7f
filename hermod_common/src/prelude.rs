//! Prelude module for common re-exports.
//!
//! ```rust
//! use hermod_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{BridgeConfig, ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Drive protocol ─────────────────────────────────────────────────
pub use crate::drive::frame::{DriveFrame, crc16_modbus, encode};
pub use crate::drive::link::{DriveLink, TransportError};

// ─── Control ────────────────────────────────────────────────────────
pub use crate::control::command::{Command, CommandOrigin, ControlState};
pub use crate::control::error::{CommandError, MessageError};
pub use crate::control::safety::{SafetyThresholds, SafetyTrip};
pub use crate::control::telemetry::TelemetrySample;
