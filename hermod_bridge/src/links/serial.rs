//! Serial links: the sensor controller and the inverter's RS-485 adapter.

use super::{LineReader, TelemetrySource};
use hermod_common::config::{DriveConfig, Parity, SensorConfig};
use hermod_common::control::telemetry::TelemetrySample;
use hermod_common::drive::link::{DriveLink, TransportError};
use serialport::{ClearBuffer, DataBits, FlowControl, SerialPort, StopBits};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

fn serial_parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn open_error(port: &str, err: serialport::Error) -> TransportError {
    TransportError::LinkDown(format!("{port}: {err}"))
}

/// Inverter link: 8 data bits, 1 stop bit, parity from config.
///
/// Writes are fire-and-forget; the inverter's echo is never read.
pub struct SerialDriveLink {
    port: Box<dyn SerialPort>,
}

impl SerialDriveLink {
    /// Open the drive port.
    pub fn open(config: &DriveConfig) -> Result<Self, TransportError> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(serial_parity(config.parity))
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(config.write_timeout_ms))
            .open()
            .map_err(|e| open_error(&config.port, e))?;

        info!(
            "Drive link open on {} ({} baud, {:?} parity, slave {})",
            config.port, config.baud_rate, config.parity, config.slave_address
        );
        Ok(Self { port })
    }
}

impl DriveLink for SerialDriveLink {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn write_frame_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.port.flush()?;
        Ok(())
    }
}

/// Sensor controller link: one JSON sample per line.
pub struct SerialTelemetrySource {
    lines: LineReader<Box<dyn SerialPort>>,
    malformed: u64,
}

impl SerialTelemetrySource {
    /// Open the sensor port.
    ///
    /// The controller resets when the port opens, so this waits
    /// `settle_ms` and then discards whatever arrived during the reset.
    pub fn open(config: &SensorConfig) -> Result<Self, TransportError> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .map_err(|e| open_error(&config.port, e))?;

        if config.settle_ms > 0 {
            std::thread::sleep(Duration::from_millis(config.settle_ms));
        }
        port.clear(ClearBuffer::Input)
            .map_err(|e| open_error(&config.port, e))?;

        info!("Sensor link open on {} ({} baud)", config.port, config.baud_rate);
        Ok(Self {
            lines: LineReader::with_max_line(port, config.max_line_bytes),
            malformed: 0,
        })
    }

    /// Lines dropped because they did not decode or were too long.
    pub fn malformed_count(&self) -> u64 {
        self.malformed + self.lines.overlong_count()
    }
}

impl TelemetrySource for SerialTelemetrySource {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn next_sample(&mut self) -> Result<Option<TelemetrySample>, TransportError> {
        let Some(line) = self.lines.poll_line()? else {
            return Ok(None);
        };
        match TelemetrySample::from_json_line(&line) {
            Ok(sample) => Ok(Some(sample)),
            Err(e) => {
                self.malformed += 1;
                debug!(
                    "Dropping sensor line from {:?}: {}",
                    self.lines.get_ref().name(),
                    e
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_mapping() {
        assert_eq!(serial_parity(Parity::Even), serialport::Parity::Even);
        assert_eq!(serial_parity(Parity::Odd), serialport::Parity::Odd);
        assert_eq!(serial_parity(Parity::None), serialport::Parity::None);
    }

    #[test]
    fn test_missing_port_is_link_down() {
        let config = DriveConfig {
            port: "/dev/hermod-does-not-exist".to_string(),
            ..DriveConfig::default()
        };
        let err = SerialDriveLink::open(&config).err().unwrap();
        assert!(err.is_link_down());
        assert!(err.to_string().contains("hermod-does-not-exist"));
    }
}
