//! Safety interlock types.
//!
//! Defines `SafetyTrip` (which interlocks fired for a sample) and
//! `SafetyThresholds` (the fixed limits, loaded from `[safety]`).

use crate::config::ConfigError;
use crate::consts::{
    SAFETY_BATTERY_LIMIT, SAFETY_BRAKE_PRESSURE, SAFETY_TEMP_LIMIT, SPEED_LIMIT_THRESHOLD,
};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Interlocks tripped by a telemetry sample.
    ///
    /// All trips force a stop except `BRAKE_PRESSURE`, which forces a full brake.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SafetyTrip: u8 {
        /// Wheel speed above the emergency-stop threshold.
        const OVERSPEED                = 0x01;
        /// Motor temperature above limit.
        const OVER_TEMPERATURE         = 0x02;
        /// Battery temperature above limit.
        const BATTERY_OVER_TEMPERATURE = 0x04;
        /// Brake line pressure above limit.
        const BRAKE_PRESSURE           = 0x08;
    }
}

impl SafetyTrip {
    /// Trips that are answered with `Command::Stop`.
    pub const STOP_MASK: Self = Self::from_bits_truncate(
        Self::OVERSPEED.bits()
            | Self::OVER_TEMPERATURE.bits()
            | Self::BATTERY_OVER_TEMPERATURE.bits(),
    );

    /// Returns true if any stop-class trip is set.
    #[inline]
    pub const fn requires_stop(&self) -> bool {
        self.intersects(Self::STOP_MASK)
    }

    /// Stable snake_case name of a single flag, for console events.
    pub fn label(&self) -> &'static str {
        if *self == Self::OVERSPEED {
            "overspeed"
        } else if *self == Self::OVER_TEMPERATURE {
            "over_temperature"
        } else if *self == Self::BATTERY_OVER_TEMPERATURE {
            "battery_over_temperature"
        } else if *self == Self::BRAKE_PRESSURE {
            "brake_pressure"
        } else {
            "multiple"
        }
    }
}

impl Default for SafetyTrip {
    fn default() -> Self {
        Self::empty()
    }
}

/// Fixed safety thresholds. A reading strictly above a threshold trips it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyThresholds {
    /// Emergency-stop speed [km/h].
    #[serde(default = "default_speed_limit")]
    pub speed_kmh: f64,
    /// Motor temperature limit [°C].
    #[serde(default = "default_temperature")]
    pub temperature_c: f64,
    /// Battery temperature limit [°C].
    #[serde(default = "default_battery_temperature")]
    pub battery_temperature_c: f64,
    /// Brake line pressure limit.
    #[serde(default = "default_brake_pressure")]
    pub brake_pressure: f64,
    /// Brake intensity used when brake pressure trips [%].
    #[serde(default = "default_brake_override_percent")]
    pub brake_override_percent: f64,
}

fn default_speed_limit() -> f64 {
    SPEED_LIMIT_THRESHOLD
}
fn default_temperature() -> f64 {
    SAFETY_TEMP_LIMIT
}
fn default_battery_temperature() -> f64 {
    SAFETY_BATTERY_LIMIT
}
fn default_brake_pressure() -> f64 {
    SAFETY_BRAKE_PRESSURE
}
fn default_brake_override_percent() -> f64 {
    100.0
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            speed_kmh: default_speed_limit(),
            temperature_c: default_temperature(),
            battery_temperature_c: default_battery_temperature(),
            brake_pressure: default_brake_pressure(),
            brake_override_percent: default_brake_override_percent(),
        }
    }
}

impl SafetyThresholds {
    /// Validate the thresholds.
    ///
    /// # Validation Rules
    /// 1. All thresholds finite
    /// 2. `brake_override_percent` in (0, 100]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("speed_kmh", self.speed_kmh),
            ("temperature_c", self.temperature_c),
            ("battery_temperature_c", self.battery_temperature_c),
            ("brake_pressure", self.brake_pressure),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "safety.{name} must be finite (got {value})"
                )));
            }
        }

        if !(self.brake_override_percent > 0.0 && self.brake_override_percent <= 100.0) {
            return Err(ConfigError::ValidationError(format!(
                "safety.brake_override_percent must be in (0, 100] (got {})",
                self.brake_override_percent
            )));
        }
        Ok(())
    }
}
