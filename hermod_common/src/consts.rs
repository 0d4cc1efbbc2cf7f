//! System-wide constants for the Hermod workspace.
//!
//! Single source of truth for physical limits, safety thresholds and
//! default link settings. Configuration defaults are derived from these.

/// Canonical service name (used for logging).
pub const BRIDGE_SERVICE_NAME: &str = "hermod_bridge";

/// Wheel speed reached at the inverter's maximum output frequency [km/h].
pub const MAX_SYSTEM_SPEED_KMH: f64 = 500.0;

/// Maximum inverter output frequency [Hz].
pub const MAX_INVERTER_FREQ_HZ: f64 = 60.0;

/// Software emergency-stop speed [km/h].
pub const SPEED_LIMIT_THRESHOLD: f64 = 250.0;

/// Motor temperature that forces a stop [°C].
pub const SAFETY_TEMP_LIMIT: f64 = 60.0;

/// Battery temperature that forces a stop [°C].
pub const SAFETY_BATTERY_LIMIT: f64 = 50.0;

/// Brake line pressure that forces a full brake.
pub const SAFETY_BRAKE_PRESSURE: f64 = 85.0;

/// Telemetry poll period in milliseconds.
pub const POLL_PERIOD_MS: u64 = 50;

/// Default Modbus slave address of the inverter (H5-01).
pub const DEFAULT_SLAVE_ADDRESS: u8 = 1;

/// Default inverter serial port.
pub const DEFAULT_DRIVE_PORT: &str = "/dev/ttyUSB0";

/// Default inverter baud rate (H5-02).
pub const DEFAULT_DRIVE_BAUD: u32 = 9600;

/// Default sensor controller serial port.
pub const DEFAULT_SENSOR_PORT: &str = "/dev/ttyACM0";

/// Default sensor controller baud rate.
pub const DEFAULT_SENSOR_BAUD: u32 = 115_200;

/// Default operator console address.
pub const DEFAULT_CONSOLE_ADDRESS: &str = "192.168.2.3:5555";

/// Longest inbound line accepted on the sensor and console links [bytes].
pub const DEFAULT_MAX_LINE_BYTES: usize = 4096;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/hermod/bridge.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(MAX_SYSTEM_SPEED_KMH > 0.0);
        assert!(MAX_INVERTER_FREQ_HZ > 0.0);
        assert!(SPEED_LIMIT_THRESHOLD <= MAX_SYSTEM_SPEED_KMH);
        assert!(POLL_PERIOD_MS > 0);
    }

    #[test]
    fn max_frequency_fits_register_resolution() {
        // 0.01 Hz resolution must stay inside a u16 register.
        assert!(MAX_INVERTER_FREQ_HZ * 100.0 <= u16::MAX as f64);
    }
}
