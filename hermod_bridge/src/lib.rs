//! # Hermod Bridge Library
//!
//! Telemetry relay, command translation and safety interlock between the
//! sensor controller, the motor drive and the operator console.
//!
//! # Module Structure
//!
//! - [`translator`] - Logical commands to drive register writes
//! - [`supervisor`] - Safety rules over telemetry samples
//! - [`channel`] - Serialized, fail-stop access to the drive
//! - [`message`] - Inbound console line parsing
//! - [`links`] - Serial, TCP and simulated links
//! - [`engine`] - ControlEngine, loop management, shutdown
//! - [`error`] - Bridge error type
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         hermod_bridge                            │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │   Sensor    │───►│ ControlEngine│◄──►│  Operator console   │  │
//! │  │  (serial)   │    │ (2 threads)  │    │  (TCP, JSON lines)  │  │
//! │  └─────────────┘    └──────┬───────┘    └─────────────────────┘  │
//! │                            │ Supervisor / Translator             │
//! │                            ▼                                     │
//! │                   ┌────────────────┐                             │
//! │                   │  DriveChannel  │ (one lock per command)      │
//! │                   └───────┬────────┘                             │
//! │                           ▼                                      │
//! │                   ┌────────────────┐                             │
//! │                   │   DriveLink    │ serial RS-485 / simulation  │
//! │                   └────────────────┘                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod channel;
pub mod engine;
pub mod error;
pub mod links;
pub mod message;
pub mod supervisor;
pub mod translator;

// Re-export key types for convenience
pub use crate::channel::DriveChannel;
pub use crate::engine::{ControlEngine, EngineState, SharedControlState, TimingStats};
pub use crate::error::EngineError;
pub use crate::supervisor::{SafetyOverride, SafetySupervisor};
pub use crate::translator::{CommandTranslator, DriveLimits, ThrottleClamp, TranslationResult};
