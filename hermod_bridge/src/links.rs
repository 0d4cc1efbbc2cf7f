//! External link implementations.
//!
//! This module contains the concrete links the engine talks through:
//!
//! - [`serial`] - Sensor controller and inverter over serial ports
//! - [`console`] - Operator console over TCP, plus the outbound record format
//! - [`simulation`] - Drive link that logs frames instead of writing them
//!
//! The engine only sees the traits below and `DriveLink` from
//! `hermod_common`, so tests drive it with in-memory links.
//!
//! # Lifecycle
//!
//! 1. Opened by the binary, in order: sensor, drive, console
//! 2. Polled by the engine; `Ok(None)` means nothing arrived before the
//!    link's read timeout
//! 3. Dropped when the engine returns

pub mod console;
pub mod serial;
pub mod simulation;

use hermod_common::consts::DEFAULT_MAX_LINE_BYTES;
use hermod_common::control::telemetry::TelemetrySample;
use hermod_common::drive::link::TransportError;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use tracing::debug;

/// Source of telemetry samples.
pub trait TelemetrySource: Send {
    /// Short identifier for logging.
    fn name(&self) -> &'static str;

    /// Wait up to the link's read timeout for the next sample.
    ///
    /// Returns `Ok(None)` on timeout or when a line could not be decoded.
    fn next_sample(&mut self) -> Result<Option<TelemetrySample>, TransportError>;
}

/// Source of raw operator command lines.
pub trait CommandSource: Send {
    /// Short identifier for logging.
    fn name(&self) -> &'static str;

    /// Wait up to the link's read timeout for the next line.
    ///
    /// Returns `Ok(None)` on timeout and `TransportError::LinkDown` once the
    /// peer has disconnected.
    fn next_line(&mut self) -> Result<Option<String>, TransportError>;
}

/// Sink for outbound console lines.
pub trait ConsoleSink: Send {
    /// Short identifier for logging.
    fn name(&self) -> &'static str;

    /// Write one line. `line` carries no trailing newline.
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;
}

/// Newline framing over a reader with a read timeout.
///
/// Partial lines survive timeouts: bytes read before a timeout are kept
/// and completed by later calls. A line longer than the limit is dropped
/// up to its newline and counted, and the stream stays open. One call
/// buffers at most the limit plus one read chunk.
pub struct LineReader<R: Read> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    max_line: usize,
    discarding: bool,
    overlong: u64,
}

impl<R: Read> LineReader<R> {
    /// Wrap `inner` with the default line limit.
    ///
    /// `inner` should already have its read timeout set.
    pub fn new(inner: R) -> Self {
        Self::with_max_line(inner, DEFAULT_MAX_LINE_BYTES)
    }

    /// Wrap `inner`, dropping lines longer than `max_line` bytes.
    pub fn with_max_line(inner: R, max_line: usize) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
            max_line: max_line.max(1),
            discarding: false,
            overlong: 0,
        }
    }

    /// Access the wrapped reader.
    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    /// Lines dropped for exceeding the limit.
    pub fn overlong_count(&self) -> u64 {
        self.overlong
    }

    /// Read until a newline, the read timeout or the line limit.
    ///
    /// Returns the line without its terminator. `Ok(None)` covers a
    /// timeout and a chunk consumed from an over-long line. End of stream
    /// is reported as `TransportError::LinkDown`.
    pub fn poll_line(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if is_timeout(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            if available.is_empty() {
                let reason = if self.pending.is_empty() && !self.discarding {
                    "peer closed the stream"
                } else {
                    "stream ended inside a line"
                };
                return Err(TransportError::LinkDown(reason.to_string()));
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let body = newline.unwrap_or(available.len());
            let used = newline.map_or(body, |i| i + 1);

            let mut overflowed = false;
            if !self.discarding {
                if self.pending.len() + body > self.max_line {
                    self.pending.clear();
                    self.discarding = true;
                    overflowed = true;
                } else {
                    self.pending.extend_from_slice(&available[..body]);
                }
            }
            self.reader.consume(used);

            if overflowed {
                self.overlong += 1;
                debug!(
                    "Dropping line longer than {} bytes (#{})",
                    self.max_line, self.overlong
                );
            }

            match newline {
                Some(_) if self.discarding => {
                    self.discarding = false;
                    return Ok(None);
                }
                Some(_) => return Ok(Some(self.take_line())),
                None if self.discarding => return Ok(None),
                None => {}
            }
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending)
            .trim_end_matches('\r')
            .to_string();
        self.pending.clear();
        line
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Reader that replays scripted chunks and timeouts.
    struct Scripted(VecDeque<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
            }
        }
    }

    fn timeout() -> io::Result<Vec<u8>> {
        Err(io::Error::new(ErrorKind::TimedOut, "timed out"))
    }

    #[test]
    fn test_complete_lines() {
        let mut r = LineReader::new(Scripted(VecDeque::from([Ok(b"a\nb\r\n".to_vec())])));
        assert_eq!(r.poll_line().unwrap().as_deref(), Some("a"));
        assert_eq!(r.poll_line().unwrap().as_deref(), Some("b"));
        assert!(r.poll_line().unwrap_err().is_link_down());
    }

    #[test]
    fn test_partial_line_survives_timeout() {
        let mut r = LineReader::new(Scripted(VecDeque::from([
            Ok(b"{\"spe".to_vec()),
            timeout(),
            Ok(b"ed\":1}\n".to_vec()),
        ])));
        assert_eq!(r.poll_line().unwrap(), None);
        assert_eq!(r.poll_line().unwrap().as_deref(), Some(r#"{"speed":1}"#));
    }

    #[test]
    fn test_overlong_line_is_dropped_and_stream_kept() {
        let mut script: VecDeque<io::Result<Vec<u8>>> =
            (0..4096).map(|_| Ok(vec![b'x'; 4096])).collect();
        script.push_back(Ok(b"tail\n{\"speed\":2}\n".to_vec()));
        script.push_back(timeout());
        let mut r = LineReader::with_max_line(Scripted(script), 64);

        // Each call returns after bounded work, without buffering the flood.
        let mut calls = 0;
        let line = loop {
            calls += 1;
            if let Some(line) = r.poll_line().unwrap() {
                break line;
            }
            assert!(r.pending.len() <= 64);
            assert!(calls <= 4098, "reader never yielded");
        };
        assert!(calls > 1);
        assert_eq!(line, r#"{"speed":2}"#);
        assert_eq!(r.overlong_count(), 1);
        assert_eq!(r.poll_line().unwrap(), None);
    }

    #[test]
    fn test_line_at_limit_is_kept() {
        let mut r = LineReader::with_max_line(
            Scripted(VecDeque::from([Ok(b"abcd\nabcde\nok\n".to_vec())])),
            4,
        );
        assert_eq!(r.poll_line().unwrap().as_deref(), Some("abcd"));
        assert_eq!(r.poll_line().unwrap(), None);
        assert_eq!(r.poll_line().unwrap().as_deref(), Some("ok"));
        assert_eq!(r.overlong_count(), 1);
    }

    #[test]
    fn test_other_errors_propagate() {
        let mut r = LineReader::new(Scripted(VecDeque::from([Err(io::Error::new(
            ErrorKind::ConnectionReset,
            "reset",
        ))])));
        assert!(r.poll_line().unwrap_err().is_link_down());
    }
}
