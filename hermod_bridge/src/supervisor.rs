//! Safety supervisor.
//!
//! Inspects every telemetry sample against fixed thresholds and produces
//! override commands. Rules are independent: each one is checked on every
//! sample and a sample tripping several rules yields one override per rule.
//!
//! | Rule                    | Field            | Override             |
//! |-------------------------|------------------|----------------------|
//! | Overspeed               | `speed`          | `Stop`               |
//! | Motor over-temperature  | `temperature`    | `Stop`               |
//! | Battery over-temperature| `battery_temp`   | `Stop`               |
//! | Brake pressure          | `brake_pressure` | `SetBrake(override)` |

use hermod_common::control::command::Command;
use hermod_common::control::safety::{SafetyThresholds, SafetyTrip};
use hermod_common::control::telemetry::TelemetrySample;

/// One tripped rule and the command that answers it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyOverride {
    /// Rule that fired.
    pub trip: SafetyTrip,
    /// Reading that exceeded the threshold.
    pub reading: f64,
    /// Threshold in force.
    pub threshold: f64,
    /// Command to send to the drive.
    pub command: Command,
}

/// Stateless evaluator of the safety rules.
#[derive(Debug, Clone, Default)]
pub struct SafetySupervisor {
    thresholds: SafetyThresholds,
}

impl SafetySupervisor {
    /// Create a supervisor with the given thresholds.
    pub fn new(thresholds: SafetyThresholds) -> Self {
        Self { thresholds }
    }

    /// Thresholds in force.
    pub fn thresholds(&self) -> &SafetyThresholds {
        &self.thresholds
    }

    /// Check every rule against `sample`, in fixed rule order.
    ///
    /// Absent fields never fire. Comparisons are strict (`>`), so a reading
    /// equal to its threshold is safe.
    pub fn inspect(&self, sample: &TelemetrySample) -> Vec<SafetyOverride> {
        let t = &self.thresholds;
        let rules = [
            (SafetyTrip::OVERSPEED, sample.speed, t.speed_kmh, Command::Stop),
            (
                SafetyTrip::OVER_TEMPERATURE,
                sample.temperature,
                t.temperature_c,
                Command::Stop,
            ),
            (
                SafetyTrip::BATTERY_OVER_TEMPERATURE,
                sample.battery_temp,
                t.battery_temperature_c,
                Command::Stop,
            ),
            (
                SafetyTrip::BRAKE_PRESSURE,
                sample.brake_pressure,
                t.brake_pressure,
                Command::SetBrake(t.brake_override_percent),
            ),
        ];

        rules
            .into_iter()
            .filter_map(|(trip, reading, threshold, command)| {
                let reading = reading?;
                (reading > threshold).then_some(SafetyOverride {
                    trip,
                    reading,
                    threshold,
                    command,
                })
            })
            .collect()
    }

    /// Override commands for `sample`, in rule order.
    pub fn evaluate(&self, sample: &TelemetrySample) -> Vec<Command> {
        self.inspect(sample).into_iter().map(|o| o.command).collect()
    }

    /// Union of the rules tripped by `sample`.
    pub fn trips(&self, sample: &TelemetrySample) -> SafetyTrip {
        self.inspect(sample)
            .iter()
            .fold(SafetyTrip::empty(), |acc, o| acc | o.trip)
    }
}
