//! Physical unit conversion for inverter registers.
//!
//! All functions are pure. Register conversions saturate instead of
//! wrapping, so any finite input maps to a representable register value.

use super::consts::{
    DECEL_COUNTS_PER_SECOND, FREQUENCY_COUNTS_PER_HZ, MIN_DECEL_S, NORMAL_STOP_DECEL_S,
};

/// Convert a wheel speed to the inverter frequency that produces it.
///
/// `speed_kmh / max_speed_kmh * max_freq_hz`
#[inline]
pub fn speed_to_frequency_hz(speed_kmh: f64, max_speed_kmh: f64, max_freq_hz: f64) -> f64 {
    speed_kmh / max_speed_kmh * max_freq_hz
}

/// Frequency reference register value (0.01 Hz per count, ties to even).
#[inline]
pub fn frequency_to_register(hz: f64) -> u16 {
    saturate_u16((hz * FREQUENCY_COUNTS_PER_HZ).round_ties_even())
}

/// Deceleration time for a brake intensity.
///
/// 10.0 s at or below 0 %, linear down to 0.1 s at 100 %, never below 0.1 s.
pub fn brake_percent_to_decel_seconds(percent: f64) -> f64 {
    if percent <= 0.0 {
        return NORMAL_STOP_DECEL_S;
    }
    let span = NORMAL_STOP_DECEL_S - MIN_DECEL_S;
    (NORMAL_STOP_DECEL_S - percent / 100.0 * span).max(MIN_DECEL_S)
}

/// Deceleration time register value (0.1 s per count, ties to even).
#[inline]
pub fn decel_seconds_to_register(seconds: f64) -> u16 {
    saturate_u16((seconds * DECEL_COUNTS_PER_SECOND).round_ties_even())
}

/// Clamp to `[0, u16::MAX]`. NaN maps to 0.
#[inline]
fn saturate_u16(value: f64) -> u16 {
    // `as` saturates for floats and sends NaN to 0.
    value.clamp(0.0, u16::MAX as f64) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_speed_is_half_frequency() {
        assert!((speed_to_frequency_hz(250.0, 500.0, 60.0) - 30.0).abs() < 1e-9);
        assert_eq!(speed_to_frequency_hz(0.0, 500.0, 60.0), 0.0);
    }

    #[test]
    fn frequency_register_rounds_to_centihertz() {
        assert_eq!(frequency_to_register(30.0), 3000);
        assert_eq!(frequency_to_register(12.34), 1234);
        assert_eq!(frequency_to_register(0.004), 0);
    }

    #[test]
    fn frequency_register_saturates() {
        assert_eq!(frequency_to_register(-5.0), 0);
        assert_eq!(frequency_to_register(1_000.0), u16::MAX);
        assert_eq!(frequency_to_register(f64::NAN), 0);
    }

    #[test]
    fn brake_zero_is_normal_stop() {
        assert_eq!(brake_percent_to_decel_seconds(0.0), 10.0);
        assert_eq!(brake_percent_to_decel_seconds(-20.0), 10.0);
    }

    #[test]
    fn brake_half_interpolates() {
        let decel = brake_percent_to_decel_seconds(50.0);
        assert!((decel - 5.05).abs() < 1e-9);
        assert_eq!(decel_seconds_to_register(decel), 50);
    }

    #[test]
    fn brake_full_and_beyond_floor_at_minimum() {
        assert!((brake_percent_to_decel_seconds(100.0) - 0.1).abs() < 1e-9);
        assert_eq!(brake_percent_to_decel_seconds(250.0), 0.1);
        assert_eq!(decel_seconds_to_register(0.1), 1);
    }

    #[test]
    fn decel_register_is_tenths_of_seconds() {
        assert_eq!(decel_seconds_to_register(10.0), 100);
        assert_eq!(decel_seconds_to_register(-1.0), 0);
    }
}
