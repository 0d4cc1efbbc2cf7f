//! Command translation: logical commands to drive register writes.
//!
//! The translator is the only place that reads or writes the speed limit
//! in `ControlState`. Callers hold the state lock for the duration of one
//! `translate()` call, which makes a `SetSpeedLimit` visible to every
//! `SetThrottle` translated after it.

use hermod_common::config::LimitsConfig;
use hermod_common::control::command::{Command, ControlState};
use hermod_common::control::error::CommandError;
use hermod_common::drive::consts::{
    DECEL_TIME, FREQUENCY, MAX_FRAMES_PER_COMMAND, OPERATION, OPERATION_RUN, OPERATION_STOP,
};
use hermod_common::drive::frame::{DriveFrame, encode};
use hermod_common::drive::units::{
    brake_percent_to_decel_seconds, decel_seconds_to_register, frequency_to_register,
    speed_to_frequency_hz,
};

/// Frames produced by one command, in transmit order.
pub type FrameBatch = heapless::Vec<DriveFrame, MAX_FRAMES_PER_COMMAND>;

/// Throttle request reduced to respect the speed limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleClamp {
    /// Frequency the operator asked for [Hz].
    pub requested_hz: f64,
    /// Frequency actually sent to the drive [Hz].
    pub applied_hz: f64,
    /// Speed limit in force at translation time [km/h].
    pub speed_limit_kmh: f64,
}

/// Output of one translation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    /// Frames to transmit, in order, as one unit.
    pub frames: FrameBatch,
    /// Human-readable description for logs and console echo.
    pub summary: String,
    /// Set when a throttle request was clamped.
    pub clamped: Option<ThrottleClamp>,
}

impl TranslationResult {
    fn new(summary: String, frames: &[DriveFrame]) -> Self {
        Self {
            // Overflow panics; MAX_FRAMES_PER_COMMAND covers the brake pair.
            frames: frames.iter().copied().collect(),
            summary,
            clamped: None,
        }
    }

    /// Returns true if a throttle request was reduced.
    #[inline]
    pub fn is_clamped(&self) -> bool {
        self.clamped.is_some()
    }
}

/// Physical scaling between wheel speed and inverter frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveLimits {
    /// Wheel speed at maximum frequency [km/h].
    pub max_system_speed_kmh: f64,
    /// Maximum inverter frequency [Hz].
    pub max_inverter_freq_hz: f64,
}

impl Default for DriveLimits {
    fn default() -> Self {
        LimitsConfig::default().into()
    }
}

impl From<LimitsConfig> for DriveLimits {
    fn from(config: LimitsConfig) -> Self {
        Self {
            max_system_speed_kmh: config.max_system_speed_kmh,
            max_inverter_freq_hz: config.max_inverter_freq_hz,
        }
    }
}

/// Turns `Command`s into frames for one drive.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    address: u8,
    limits: DriveLimits,
}

impl CommandTranslator {
    /// Create a translator for the drive at `address`.
    pub fn new(address: u8, limits: DriveLimits) -> Self {
        Self { address, limits }
    }

    /// Modbus slave address frames are sent to.
    #[inline]
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Scaling in use.
    #[inline]
    pub const fn limits(&self) -> DriveLimits {
        self.limits
    }

    /// Frequency equivalent of the current speed limit [Hz].
    pub fn limit_hz(&self, state: &ControlState) -> f64 {
        speed_to_frequency_hz(
            state.speed_limit_kmh(),
            self.limits.max_system_speed_kmh,
            self.limits.max_inverter_freq_hz,
        )
    }

    /// Translate one command.
    ///
    /// # Errors
    /// `CommandError::InvalidCommandValue` for a non-finite payload or a
    /// negative speed limit. The state is left untouched on error.
    pub fn translate(
        &self,
        cmd: Command,
        state: &mut ControlState,
    ) -> Result<TranslationResult, CommandError> {
        if let Some(value) = cmd.value() {
            if !value.is_finite() {
                return Err(invalid(cmd, value));
            }
        }

        match cmd {
            Command::Start => Ok(self.operation(OPERATION_RUN, "motor on")),
            Command::Stop => Ok(self.operation(OPERATION_STOP, "motor off")),
            Command::SetSpeedLimit(kmh) => {
                if kmh < 0.0 {
                    return Err(invalid(cmd, kmh));
                }
                let stored = state.set_speed_limit_kmh(kmh);
                let summary = if stored < kmh {
                    format!("speed limit {kmh} km/h capped at {stored} km/h")
                } else {
                    format!("speed limit set to {stored} km/h")
                };
                Ok(TranslationResult::new(summary, &[]))
            }
            Command::SetThrottle(requested_hz) => {
                let limit_hz = self.limit_hz(state);
                let final_hz = requested_hz.min(limit_hz);
                let frame = encode(self.address, FREQUENCY, frequency_to_register(final_hz));

                let result = if final_hz < requested_hz {
                    let mut r = TranslationResult::new(
                        format!(
                            "frequency {requested_hz} Hz clamped to {final_hz:.2} Hz (limit {} km/h)",
                            state.speed_limit_kmh()
                        ),
                        &[frame],
                    );
                    r.clamped = Some(ThrottleClamp {
                        requested_hz,
                        applied_hz: final_hz,
                        speed_limit_kmh: state.speed_limit_kmh(),
                    });
                    r
                } else {
                    TranslationResult::new(format!("frequency set to {final_hz:.2} Hz"), &[frame])
                };
                Ok(result)
            }
            Command::SetBrake(percent) => {
                let decel = brake_percent_to_decel_seconds(percent);
                // Ramp first, then stop; the drive stops on whatever ramp is loaded.
                Ok(TranslationResult::new(
                    format!("brake {percent}%: decel {decel:.2} s, then stop"),
                    &[
                        encode(self.address, DECEL_TIME, decel_seconds_to_register(decel)),
                        encode(self.address, OPERATION, OPERATION_STOP),
                    ],
                ))
            }
        }
    }

    fn operation(&self, value: u16, summary: &str) -> TranslationResult {
        TranslationResult::new(summary.to_string(), &[encode(self.address, OPERATION, value)])
    }
}

fn invalid(cmd: Command, value: f64) -> CommandError {
    CommandError::InvalidCommandValue {
        command: cmd.name(),
        value,
    }
}
