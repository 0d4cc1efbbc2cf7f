//! Property-based tests for the drive frame codec and unit conversion.
//!
//! Uses proptest to check the codec over its whole input space rather
//! than a handful of hand-picked registers.

use hermod_common::drive::consts::{
    DECEL_TIME, FRAME_LEN, FREQUENCY, OPERATION, TORQUE_LIMIT, WRITE_SINGLE_REGISTER,
};
use hermod_common::drive::frame::{DriveFrame, crc16_modbus, encode};
use hermod_common::drive::units::{
    brake_percent_to_decel_seconds, decel_seconds_to_register, frequency_to_register,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every encoded frame carries a CRC that validates over its first six bytes.
    #[test]
    fn prop_crc_round_trip(address: u8, register: u16, value: u16) {
        let frame = encode(address, register, value);
        let bytes = frame.as_bytes();
        prop_assert_eq!(bytes.len(), FRAME_LEN);
        let crc = crc16_modbus(&bytes[..6]);
        prop_assert_eq!(bytes[6], (crc & 0xFF) as u8, "CRC low byte must come first");
        prop_assert_eq!(bytes[7], (crc >> 8) as u8);
        prop_assert!(frame.verify());
    }

    /// Identical arguments give byte-identical frames.
    #[test]
    fn prop_encode_deterministic(address: u8, register: u16, value: u16) {
        let first = encode(address, register, value);
        let second = encode(address, register, value);
        prop_assert_eq!(
            first.as_bytes(),
            second.as_bytes()
        );
    }

    /// Header fields decode back to the encoded arguments.
    #[test]
    fn prop_fields_round_trip(address: u8, register: u16, value: u16) {
        let frame = encode(address, register, value);
        prop_assert_eq!(frame.address(), address);
        prop_assert_eq!(frame.function(), WRITE_SINGLE_REGISTER);
        prop_assert_eq!(frame.register(), register);
        prop_assert_eq!(frame.value(), value);
    }

    /// Flipping any single bit of a frame breaks verification.
    #[test]
    fn prop_single_bit_flip_detected(value in any::<u16>(), byte in 0usize..FRAME_LEN, bit in 0u8..8) {
        let mut bytes = *encode(1, FREQUENCY, value).as_bytes();
        bytes[byte] ^= 1 << bit;
        prop_assert!(!DriveFrame::from_bytes(bytes).verify());
    }

    /// Brake-to-deceleration mapping never increases on [0, 100].
    #[test]
    fn prop_brake_monotonic(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            brake_percent_to_decel_seconds(lo) >= brake_percent_to_decel_seconds(hi),
            "decel({lo}) < decel({hi})"
        );
    }

    /// Deceleration stays within [0.1, 10.0] for any finite brake request.
    #[test]
    fn prop_brake_bounded(percent in -1000.0f64..1000.0) {
        let decel = brake_percent_to_decel_seconds(percent);
        prop_assert!((0.1..=10.0).contains(&decel), "decel {decel} out of bounds");
        let reg = decel_seconds_to_register(decel);
        prop_assert!((1..=100).contains(&reg), "register {reg} out of bounds");
    }

    /// Frequency registers are within half a count of the requested value
    /// inside the representable range.
    #[test]
    fn prop_frequency_register_resolution(hz in 0.0f64..655.0) {
        let reg = frequency_to_register(hz);
        let back = reg as f64 / 100.0;
        prop_assert!((back - hz).abs() <= 0.005 + 1e-9, "{hz} Hz -> {reg}");
    }
}

#[test]
fn brake_endpoints() {
    assert_eq!(brake_percent_to_decel_seconds(0.0), 10.0);
    assert!((brake_percent_to_decel_seconds(100.0) - 0.1).abs() < 1e-12);
    assert!(brake_percent_to_decel_seconds(100.0) >= 0.1);
}

#[test]
fn register_map_is_fixed() {
    assert_eq!(OPERATION, 0x0001);
    assert_eq!(FREQUENCY, 0x0002);
    assert_eq!(DECEL_TIME, 0x0202);
    assert_eq!(TORQUE_LIMIT, 0x000C);
}

#[test]
fn brake_sequence_scenario_frames() {
    // SetBrake(50): 5.05 s -> register 50.
    let decel = brake_percent_to_decel_seconds(50.0);
    let first = encode(1, DECEL_TIME, decel_seconds_to_register(decel));
    assert_eq!(first.value(), 50);
    assert_eq!(
        first.as_bytes(),
        &[0x01, 0x06, 0x02, 0x02, 0x00, 0x32, 0xA8, 0x67]
    );
}
