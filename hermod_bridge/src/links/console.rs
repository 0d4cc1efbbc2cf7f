//! Operator console over TCP.
//!
//! The bridge connects out to the console and keeps one stream: the write
//! half carries telemetry and event lines, the read half carries command
//! lines. Outbound records are one JSON object per line; events carry an
//! `"event"` tag so the console can tell them apart from samples.

use super::{CommandSource, ConsoleSink, LineReader};
use hermod_common::config::ConsoleConfig;
use hermod_common::control::command::{Command, CommandOrigin};
use hermod_common::control::telemetry::TelemetrySample;
use hermod_common::drive::link::TransportError;
use serde::Serialize;
use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;
use tracing::info;

/// Event line sent to the console.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    /// A safety rule fired.
    SafetyOverride {
        /// Rule label (see `SafetyTrip::label`).
        rule: &'static str,
        /// Reading that tripped the rule.
        reading: f64,
        /// Threshold in force.
        threshold: f64,
        /// Override command.
        command: Command,
        /// Whether the override reached the drive.
        delivered: bool,
    },
    /// A throttle request was reduced to the speed limit.
    ThrottleClamped {
        /// Requested frequency [Hz].
        requested_hz: f64,
        /// Frequency sent [Hz].
        applied_hz: f64,
        /// Speed limit in force [km/h].
        speed_limit_kmh: f64,
    },
    /// A write to the drive failed; no further frames will be sent.
    DriveLinkDown {
        /// Command whose frames could not be sent.
        command: Command,
        /// Who issued it.
        origin: CommandOrigin,
        /// Transport error text.
        reason: String,
    },
    /// The sensor link failed or closed.
    SensorLinkDown {
        /// Transport error text.
        reason: String,
    },
    /// The bridge is shutting down.
    Shutdown {
        /// Frames written to the drive over the session.
        frames_sent: u64,
    },
}

impl Notification {
    /// Encode as one JSON line, without the newline.
    pub fn to_line(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Io(e.to_string()))
    }
}

/// Encode a telemetry sample for the console, unknown fields included.
pub fn sample_line(sample: &TelemetrySample) -> Result<String, TransportError> {
    serde_json::to_string(sample).map_err(|e| TransportError::Io(e.to_string()))
}

/// Connect to the console.
///
/// Returns the outbound sink and the inbound command source, both backed
/// by the same stream. The source's read timeout is
/// `console.read_timeout_ms` so the ingest loop can observe shutdown.
pub fn connect(config: &ConsoleConfig) -> Result<(TcpConsoleSink, TcpCommandSource), TransportError> {
    let stream = TcpStream::connect(config.address.as_str()).map_err(|e| {
        TransportError::LinkDown(format!("console {}: {}", config.address, e))
    })?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
    let reader = stream.try_clone()?;

    info!("Connected to console at {}", config.address);
    Ok((
        TcpConsoleSink { stream },
        TcpCommandSource {
            lines: LineReader::with_max_line(reader, config.max_line_bytes),
        },
    ))
}

/// Write half of the console connection.
pub struct TcpConsoleSink {
    stream: TcpStream,
}

impl ConsoleSink for TcpConsoleSink {
    fn name(&self) -> &'static str {
        "tcp"
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\n")?;
        Ok(())
    }
}

impl Drop for TcpConsoleSink {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// Read half of the console connection.
pub struct TcpCommandSource {
    lines: LineReader<TcpStream>,
}

impl CommandSource for TcpCommandSource {
    fn name(&self) -> &'static str {
        "tcp"
    }

    fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        self.lines.poll_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;

    #[test]
    fn test_notification_shapes() {
        let line = Notification::SafetyOverride {
            rule: "overspeed",
            reading: 300.0,
            threshold: 250.0,
            command: Command::Stop,
            delivered: true,
        }
        .to_line()
        .unwrap();
        let v: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["event"], "safety_override");
        assert_eq!(v["rule"], "overspeed");
        assert_eq!(v["command"]["kind"], "stop");
        assert_eq!(v["delivered"], true);

        let v: Value = serde_json::from_str(
            &Notification::Shutdown { frames_sent: 7 }.to_line().unwrap(),
        )
        .unwrap();
        assert_eq!(v["event"], "shutdown");
        assert_eq!(v["frames_sent"], 7);
    }

    #[test]
    fn test_sample_line_is_flat() {
        let sample = TelemetrySample::from_json_line(r#"{"speed":12.0,"lap":3}"#).unwrap();
        let v: Value = serde_json::from_str(&sample_line(&sample).unwrap()).unwrap();
        assert_eq!(v["speed"], 12.0);
        assert_eq!(v["lap"], 3);
        assert!(v.get("event").is_none());
    }

    #[test]
    fn test_tcp_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ConsoleConfig {
            address: listener.local_addr().unwrap().to_string(),
            read_timeout_ms: 20,
            max_line_bytes: 64,
        };

        let (mut sink, mut source) = connect(&config).unwrap();
        let (mut peer, _) = listener.accept().unwrap();

        // Nothing sent yet: the read times out.
        assert_eq!(source.next_line().unwrap(), None);

        peer.write_all(b"{\"command\":\"STOP\"}\n").unwrap();
        let mut line = None;
        for _ in 0..50 {
            line = source.next_line().unwrap();
            if line.is_some() {
                break;
            }
        }
        assert_eq!(line.as_deref(), Some(r#"{"command":"STOP"}"#));

        // An over-long line is skipped and the connection stays usable.
        let mut flood = vec![b'x'; 200];
        flood.extend_from_slice(b"\n{\"command\":\"START\"}\n");
        peer.write_all(&flood).unwrap();
        let mut line = None;
        for _ in 0..50 {
            line = source.next_line().unwrap();
            if line.is_some() {
                break;
            }
        }
        assert_eq!(line.as_deref(), Some(r#"{"command":"START"}"#));

        sink.write_line(r#"{"speed":1.0}"#).unwrap();
        let mut reader = BufReader::new(peer.try_clone().unwrap());
        let mut received = String::new();
        reader.read_line(&mut received).unwrap();
        assert_eq!(received, "{\"speed\":1.0}\n");

        drop(peer);
        drop(reader);
        let mut closed = false;
        for _ in 0..50 {
            match source.next_line() {
                Err(e) => {
                    assert!(e.is_link_down());
                    closed = true;
                    break;
                }
                Ok(_) => {}
            }
        }
        assert!(closed);
    }
}
