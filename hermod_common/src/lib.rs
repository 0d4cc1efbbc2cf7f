//! Hermod Common Library
//!
//! Shared types for the Hermod bridge: the inverter's Modbus RTU protocol,
//! logical commands, telemetry samples, safety thresholds and configuration.
//!
//! # Module Structure
//!
//! - [`consts`] - Physical limits, thresholds and link defaults
//! - [`config`] - Configuration loading traits and types
//! - [`drive`] - Register map, frame codec, unit conversion, `DriveLink`
//! - [`control`] - Commands, control state, telemetry, safety, errors
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use hermod_common::drive::consts::FREQUENCY;
//! use hermod_common::drive::frame::encode;
//!
//! let frame = encode(1, FREQUENCY, 3000);
//! assert!(frame.verify());
//! ```

pub mod config;
pub mod consts;
pub mod control;
pub mod drive;
pub mod prelude;
