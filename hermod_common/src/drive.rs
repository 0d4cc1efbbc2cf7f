//! Drive protocol types.
//!
//! This module contains everything needed to talk to the inverter:
//! the register map, the Modbus RTU frame codec, physical unit conversion
//! and the `DriveLink` transport trait.

pub mod consts;
pub mod frame;
pub mod link;
pub mod units;
