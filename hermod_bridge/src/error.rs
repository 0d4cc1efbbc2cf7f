//! Bridge error type.

use hermod_common::config::ConfigError;
use hermod_common::control::error::{CommandError, MessageError};
use hermod_common::drive::link::TransportError;
use thiserror::Error;

/// Errors surfaced by the engine and the binary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A link failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A command carried an untranslatable value.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// An inbound console line was rejected.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// A link could not be brought up at startup.
    #[error("Startup failed: {0}")]
    Startup(String),
}
