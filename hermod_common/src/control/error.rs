//! Error types for command translation and inbound message decoding.
//!
//! Both kinds are recovered locally: the offending command or line is
//! dropped and the activity that produced it keeps running.

use thiserror::Error;

/// A structurally valid command carried a value that cannot be translated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// Non-finite or out-of-range numeric payload.
    #[error("Invalid value {value} for command '{command}'")]
    InvalidCommandValue {
        /// Command name (see `Command::name`).
        command: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// An inbound line could not be turned into a command or sample.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Not valid JSON, or the wrong shape.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Well-formed message naming a command the bridge does not know.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_display() {
        let err = CommandError::InvalidCommandValue {
            command: "set_throttle",
            value: f64::INFINITY,
        };
        let text = err.to_string();
        assert!(text.contains("set_throttle"));
        assert!(text.contains("inf"));
    }

    #[test]
    fn test_message_error_display() {
        let err = MessageError::UnknownCommand("warp".to_string());
        assert_eq!(err.to_string(), "Unknown command: warp");
    }
}
