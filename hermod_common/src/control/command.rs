//! Logical drive commands and the live control state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical command for the drive.
///
/// Built from an operator console message or synthesized by the safety
/// supervisor. Consumed exactly once by the translator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Command {
    /// Run the motor.
    Start,
    /// Stop the motor on the drive's current deceleration ramp.
    Stop,
    /// Update the operator speed limit [km/h]. Emits no frame.
    SetSpeedLimit(f64),
    /// Request an output frequency [Hz], clamped to the speed limit.
    SetThrottle(f64),
    /// Brake with the given intensity [%].
    SetBrake(f64),
}

impl Command {
    /// Short lowercase name for logs and console events.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::SetSpeedLimit(_) => "set_speed_limit",
            Self::SetThrottle(_) => "set_throttle",
            Self::SetBrake(_) => "set_brake",
        }
    }

    /// Numeric payload, if the variant carries one.
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Start | Self::Stop => None,
            Self::SetSpeedLimit(v) | Self::SetThrottle(v) | Self::SetBrake(v) => Some(*v),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => write!(f, "{}({})", self.name(), v),
            None => f.write_str(self.name()),
        }
    }
}

/// Who issued a command. Used for logging and console events only;
/// every origin goes through the same translate/transmit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOrigin {
    /// Operator console.
    Operator,
    /// Safety supervisor override.
    Safety,
    /// Final stop issued while shutting down.
    Shutdown,
}

impl Default for CommandOrigin {
    fn default() -> Self {
        Self::Operator
    }
}

/// Live configuration shared by the telemetry and command activities.
///
/// Invariant: `0 <= speed_limit_kmh <= max_speed_kmh`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    speed_limit_kmh: f64,
    max_speed_kmh: f64,
}

impl ControlState {
    /// Start with the speed limit at the rated maximum.
    pub fn new(max_speed_kmh: f64) -> Self {
        let max_speed_kmh = max_speed_kmh.max(0.0);
        Self {
            speed_limit_kmh: max_speed_kmh,
            max_speed_kmh,
        }
    }

    /// Current operator speed limit [km/h].
    #[inline]
    pub const fn speed_limit_kmh(&self) -> f64 {
        self.speed_limit_kmh
    }

    /// Rated maximum system speed [km/h].
    #[inline]
    pub const fn max_speed_kmh(&self) -> f64 {
        self.max_speed_kmh
    }

    /// Store a new limit, clamped into `[0, max_speed_kmh]`.
    ///
    /// Returns the value actually stored. The caller is responsible for
    /// rejecting non-finite input first.
    pub fn set_speed_limit_kmh(&mut self, kmh: f64) -> f64 {
        self.speed_limit_kmh = kmh.clamp(0.0, self.max_speed_kmh);
        self.speed_limit_kmh
    }
}
