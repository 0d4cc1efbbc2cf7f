//! Transport trait and error types for external links.
//!
//! This module defines:
//! - `DriveLink` trait - byte sink for the inverter's serial transceiver
//! - `TransportError` enum - link failures shared by drive, sensor and console

use thiserror::Error;

/// Failure of a physical or network link.
///
/// Fatal to the current control cycle. There is no automatic reconnect;
/// once a link reports `LinkDown` it stays down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The link is unavailable (never opened, released, or lost).
    #[error("Link down: {0}")]
    LinkDown(String),

    /// An I/O operation on an open link failed.
    #[error("Link I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// Returns true for `LinkDown`.
    #[inline]
    pub const fn is_link_down(&self) -> bool {
        matches!(self, Self::LinkDown(_))
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof => Self::LinkDown(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

/// Byte sink for the drive.
///
/// Writes are fire-and-forget: the inverter's echo is never read back.
/// Implementations must be `Send` so the owning channel can be shared
/// between the telemetry and command threads.
///
/// # Lifecycle
///
/// 1. Opened by the binary before the engine starts
/// 2. `write_frame_bytes()` - called with the channel lock held
/// 3. `close()` - called once when the channel releases the link
pub trait DriveLink: Send {
    /// Short identifier for logging (e.g. "serial", "simulation").
    fn name(&self) -> &'static str;

    /// Write one frame's bytes. Must not return until the bytes are handed
    /// to the transport.
    fn write_frame_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Flush buffered bytes to the wire.
    ///
    /// Default: no-op.
    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Release the underlying device.
    ///
    /// Default: no-op (dropping the link closes it).
    fn close(&mut self) {}
}
