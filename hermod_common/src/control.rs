//! Control types shared between the bridge and its tests.
//!
//! Organized by domain: commands and the shared control state, telemetry
//! samples, safety thresholds and trip flags, and command/message errors.

pub mod command;
pub mod error;
pub mod safety;
pub mod telemetry;
