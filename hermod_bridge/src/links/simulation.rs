//! Simulated drive.
//!
//! `SimulatedDriveLink` accepts frames like the real inverter would, checks
//! their CRC, decodes the register writes into a small drive model and
//! logs them. Selected with `--simulate`; also used by the tests as an
//! in-memory drive.

use hermod_common::drive::consts::{
    DECEL_COUNTS_PER_SECOND, DECEL_TIME, FRAME_LEN, FREQUENCY, FREQUENCY_COUNTS_PER_HZ, OPERATION,
    OPERATION_RUN, TORQUE_LIMIT,
};
use hermod_common::drive::frame::DriveFrame;
use hermod_common::drive::link::{DriveLink, TransportError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Register-level view of the simulated inverter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatedDriveState {
    /// Motor running.
    pub running: bool,
    /// Frequency reference [Hz].
    pub frequency_hz: f64,
    /// Deceleration ramp [s].
    pub decel_s: f64,
    /// Every frame received, in order.
    pub frames: Vec<DriveFrame>,
    /// Frames dropped because of a bad length or CRC.
    pub rejected: u64,
}

impl SimulatedDriveState {
    fn apply(&mut self, frame: DriveFrame) {
        match frame.register() {
            OPERATION => self.running = frame.value() == OPERATION_RUN,
            FREQUENCY => self.frequency_hz = f64::from(frame.value()) / FREQUENCY_COUNTS_PER_HZ,
            DECEL_TIME => self.decel_s = f64::from(frame.value()) / DECEL_COUNTS_PER_SECOND,
            TORQUE_LIMIT => {}
            other => warn!("Simulated drive: write to unmapped register 0x{other:04X}"),
        }
        self.frames.push(frame);
    }
}

/// Shared read access to a simulated drive, for tests and shutdown reports.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDriveHandle(Arc<Mutex<SimulatedDriveState>>);

impl SimulatedDriveHandle {
    /// Copy of the current drive state.
    pub fn snapshot(&self) -> SimulatedDriveState {
        self.0.lock().clone()
    }

    /// Registers written so far, in order.
    pub fn writes(&self) -> Vec<(u16, u16)> {
        self.0
            .lock()
            .frames
            .iter()
            .map(|f| (f.register(), f.value()))
            .collect()
    }
}

/// In-process stand-in for the inverter.
#[derive(Debug)]
pub struct SimulatedDriveLink {
    state: SimulatedDriveHandle,
    fail_after: Option<usize>,
    closed: bool,
}

impl SimulatedDriveLink {
    /// Create a drive and a handle to observe it.
    pub fn new() -> (Self, SimulatedDriveHandle) {
        let handle = SimulatedDriveHandle::default();
        let link = Self {
            state: handle.clone(),
            fail_after: None,
            closed: false,
        };
        (link, handle)
    }

    /// Make every write after the first `frames` fail with `LinkDown`.
    pub fn with_failure_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }
}

impl DriveLink for SimulatedDriveLink {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn write_frame_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::LinkDown("simulated drive closed".to_string()));
        }

        let mut state = self.state.0.lock();
        if self.fail_after.is_some_and(|n| state.frames.len() >= n) {
            return Err(TransportError::LinkDown(
                "simulated drive disconnected".to_string(),
            ));
        }

        let Ok(raw) = <[u8; FRAME_LEN]>::try_from(bytes) else {
            state.rejected += 1;
            warn!("Simulated drive: dropped {}-byte write", bytes.len());
            return Ok(());
        };
        let frame = DriveFrame::from_bytes(raw);
        if !frame.verify() {
            state.rejected += 1;
            warn!("Simulated drive: CRC mismatch in {:?}", frame);
            return Ok(());
        }

        state.apply(frame);
        info!(
            "Simulated drive: reg 0x{:04X} <- {} (running={}, {:.2} Hz, decel {:.1} s)",
            frame.register(),
            frame.value(),
            state.running,
            state.frequency_hz,
            state.decel_s
        );
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
