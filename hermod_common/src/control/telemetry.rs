//! Telemetry samples from the motion platform's sensor controller.
//!
//! One sample arrives per poll as a JSON line. Every field is optional;
//! fields the bridge does not know about are kept and forwarded untouched.

use super::error::MessageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One decoded snapshot of sensor readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Wheel speed [km/h].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Motor temperature [°C].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Battery temperature [°C].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_temp: Option<f64>,

    /// Brake line pressure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake_pressure: Option<f64>,

    /// Track position [m].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,

    /// Longitudinal acceleration [m/s²].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<f64>,

    /// Any other fields reported by the controller.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TelemetrySample {
    /// Decode one line from the sensor link.
    pub fn from_json_line(line: &str) -> Result<Self, MessageError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(MessageError::Malformed("empty line".to_string()));
        }
        serde_json::from_str(trimmed).map_err(|e| MessageError::Malformed(e.to_string()))
    }

    /// Look up a numeric field by name, including unknown fields.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "speed" => self.speed,
            "temperature" => self.temperature,
            "battery_temp" => self.battery_temp,
            "brake_pressure" => self.brake_pressure,
            "position" => self.position,
            "acceleration" => self.acceleration,
            other => self.extra.get(other).and_then(Value::as_f64),
        }
    }

    /// Set `speed`.
    pub fn with_speed(mut self, value: f64) -> Self {
        self.speed = Some(value);
        self
    }

    /// Set `temperature`.
    pub fn with_temperature(mut self, value: f64) -> Self {
        self.temperature = Some(value);
        self
    }

    /// Set `battery_temp`.
    pub fn with_battery_temp(mut self, value: f64) -> Self {
        self.battery_temp = Some(value);
        self
    }

    /// Set `brake_pressure`.
    pub fn with_brake_pressure(mut self, value: f64) -> Self {
        self.brake_pressure = Some(value);
        self
    }
}
