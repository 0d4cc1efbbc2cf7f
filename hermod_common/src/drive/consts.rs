//! Inverter register map and Modbus RTU framing constants.

use static_assertions::const_assert;

/// Modbus function code: write single holding register.
pub const WRITE_SINGLE_REGISTER: u8 = 0x06;

/// Length of a complete write-single-register frame in bytes.
pub const FRAME_LEN: usize = 8;

/// Length of the frame prefix covered by the CRC.
pub const FRAME_PAYLOAD_LEN: usize = FRAME_LEN - 2;

/// Run command register (0 = stop, 1 = forward run).
pub const OPERATION: u16 = 0x0001;

/// Frequency reference register [0.01 Hz].
pub const FREQUENCY: u16 = 0x0002;

/// Deceleration time 1 register (C1-02) [0.1 s].
pub const DECEL_TIME: u16 = 0x0202;

/// Torque limit register. Not written by the current brake sequence.
pub const TORQUE_LIMIT: u16 = 0x000C;

/// `OPERATION` value that starts the motor.
pub const OPERATION_RUN: u16 = 1;

/// `OPERATION` value that stops the motor.
pub const OPERATION_STOP: u16 = 0;

/// Frequency register resolution (counts per Hz).
pub const FREQUENCY_COUNTS_PER_HZ: f64 = 100.0;

/// Deceleration register resolution (counts per second).
pub const DECEL_COUNTS_PER_SECOND: f64 = 10.0;

/// Deceleration ramp for a normal stop [s].
pub const NORMAL_STOP_DECEL_S: f64 = 10.0;

/// Shortest deceleration ramp the brake sequence will request [s].
pub const MIN_DECEL_S: f64 = 0.1;

/// Maximum number of frames a single command can produce.
pub const MAX_FRAMES_PER_COMMAND: usize = 2;

// The brake sequence is the longest: DECEL_TIME then OPERATION.
const_assert!(MAX_FRAMES_PER_COMMAND >= 2);
