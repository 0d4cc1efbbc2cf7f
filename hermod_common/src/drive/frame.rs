//! Modbus RTU write-single-register frame codec.
//!
//! Frame layout (8 bytes):
//!
//! ```text
//! ┌──────┬──────┬────────┬────────┬────────┬────────┬────────┬────────┐
//! │ addr │ 0x06 │ reg_hi │ reg_lo │ val_hi │ val_lo │ crc_lo │ crc_hi │
//! └──────┴──────┴────────┴────────┴────────┴────────┴────────┴────────┘
//! ```
//!
//! The CRC is CRC-16/Modbus (poly 0xA001 reflected, init 0xFFFF) over the
//! first six bytes, appended low byte first.

use super::consts::{FRAME_LEN, FRAME_PAYLOAD_LEN, WRITE_SINGLE_REGISTER};
use static_assertions::const_assert_eq;
use std::fmt;

/// One encoded register write, ready for the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriveFrame([u8; FRAME_LEN]);

const_assert_eq!(core::mem::size_of::<DriveFrame>(), FRAME_LEN);

impl DriveFrame {
    /// Wrap raw bytes received from elsewhere. No validation is done here;
    /// call [`verify`](Self::verify) to check the CRC.
    #[inline]
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw frame bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Slave address.
    #[inline]
    pub const fn address(&self) -> u8 {
        self.0[0]
    }

    /// Modbus function code.
    #[inline]
    pub const fn function(&self) -> u8 {
        self.0[1]
    }

    /// Target register.
    #[inline]
    pub const fn register(&self) -> u16 {
        u16::from_be_bytes([self.0[2], self.0[3]])
    }

    /// Register value.
    #[inline]
    pub const fn value(&self) -> u16 {
        u16::from_be_bytes([self.0[4], self.0[5]])
    }

    /// CRC carried in the trailing two bytes.
    #[inline]
    pub const fn crc(&self) -> u16 {
        u16::from_le_bytes([self.0[6], self.0[7]])
    }

    /// Returns true if the trailing CRC matches the first six bytes.
    pub fn verify(&self) -> bool {
        crc16_modbus(&self.0[..FRAME_PAYLOAD_LEN]) == self.crc()
    }
}

impl fmt::Debug for DriveFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DriveFrame {{ addr: {}, reg: {:#06X}, value: {}, bytes: {:02X?} }}",
            self.address(),
            self.register(),
            self.value(),
            self.0
        )
    }
}

impl AsRef<[u8]> for DriveFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// CRC-16/Modbus, computed one bit at a time.
pub fn crc16_modbus(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &b in bytes {
        crc ^= b as u16;
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Encode a write-single-register frame.
///
/// Total and deterministic: identical arguments always give identical bytes.
pub fn encode(address: u8, register: u16, value: u16) -> DriveFrame {
    let reg = register.to_be_bytes();
    let val = value.to_be_bytes();
    let mut bytes = [
        address,
        WRITE_SINGLE_REGISTER,
        reg[0],
        reg[1],
        val[0],
        val[1],
        0,
        0,
    ];
    let crc = crc16_modbus(&bytes[..FRAME_PAYLOAD_LEN]).to_le_bytes();
    bytes[6] = crc[0];
    bytes[7] = crc[1];
    DriveFrame(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::consts::{DECEL_TIME, FREQUENCY, OPERATION};

    #[test]
    fn crc_of_empty_input_is_initial_value() {
        assert_eq!(crc16_modbus(&[]), 0xFFFF);
    }

    #[test]
    fn crc_matches_reference_check_value() {
        // CRC-16/MODBUS check value for "123456789".
        assert_eq!(crc16_modbus(b"123456789"), 0x4B37);
    }

    #[test]
    fn start_frame_matches_known_bytes() {
        // 01 06 00 01 00 01 -> CRC 0xCA19, sent as 19 CA.
        let frame = encode(1, OPERATION, 1);
        assert_eq!(
            frame.as_bytes(),
            &[0x01, 0x06, 0x00, 0x01, 0x00, 0x01, 0x19, 0xCA]
        );
    }

    #[test]
    fn accessors_decode_fields() {
        let frame = encode(7, DECEL_TIME, 505);
        assert_eq!(frame.address(), 7);
        assert_eq!(frame.function(), WRITE_SINGLE_REGISTER);
        assert_eq!(frame.register(), DECEL_TIME);
        assert_eq!(frame.value(), 505);
        assert!(frame.verify());
    }

    #[test]
    fn corrupted_frame_fails_verification() {
        let frame = encode(1, FREQUENCY, 3000);
        let mut bytes = *frame.as_bytes();
        bytes[5] ^= 0x01;
        assert!(!DriveFrame::from_bytes(bytes).verify());
    }

    #[test]
    fn encode_is_deterministic() {
        assert_eq!(encode(1, FREQUENCY, 4500), encode(1, FREQUENCY, 4500));
    }
}
