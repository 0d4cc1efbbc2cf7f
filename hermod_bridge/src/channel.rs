//! Exclusive access to the drive link.
//!
//! `DriveChannel` owns the one `DriveLink` and serializes every write.
//! A multi-frame command is written under a single lock acquisition so no
//! other command's frames can land between its frames on the wire.

use hermod_common::drive::frame::DriveFrame;
use hermod_common::drive::link::{DriveLink, TransportError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

struct ChannelInner {
    link: Option<Box<dyn DriveLink>>,
    /// Reason the link went down, reported by every later transmit.
    down_reason: Option<String>,
}

/// Serialized, fail-stop access to the drive.
pub struct DriveChannel {
    inner: Mutex<ChannelInner>,
    name: &'static str,
    frames_sent: AtomicU64,
}

impl DriveChannel {
    /// Take ownership of an opened link.
    pub fn new(link: Box<dyn DriveLink>) -> Self {
        let name = link.name();
        Self {
            inner: Mutex::new(ChannelInner {
                link: Some(link),
                down_reason: None,
            }),
            name,
            frames_sent: AtomicU64::new(0),
        }
    }

    /// Name of the underlying link.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Write `frames` in order as one unit.
    ///
    /// The first failed write marks the link dead: the remaining frames of
    /// this batch are not written and every later call returns
    /// `TransportError::LinkDown`. There is no reconnect.
    pub fn transmit(&self, frames: &[DriveFrame]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();

        let ChannelInner { link, down_reason } = &mut *inner;
        let Some(drive) = link.as_mut() else {
            let reason = down_reason
                .clone()
                .unwrap_or_else(|| "drive link released".to_string());
            return Err(TransportError::LinkDown(reason));
        };

        for frame in frames {
            debug_assert!(frame.verify(), "frame with bad CRC: {frame:?}");
            let result = drive
                .write_frame_bytes(frame.as_bytes())
                .and_then(|()| drive.flush());
            if let Err(e) = result {
                error!("Drive link '{}' failed: {}", self.name, e);
                if let Some(mut dead) = link.take() {
                    dead.close();
                }
                *down_reason = Some(e.to_string());
                return Err(e);
            }
            self.frames_sent.fetch_add(1, Ordering::Relaxed);
            debug!("-> drive {:?}", frame);
        }
        Ok(())
    }

    /// Close the link. Later transmits fail with `LinkDown`.
    pub fn release(&self) {
        let mut inner = self.inner.lock();
        if let Some(mut link) = inner.link.take() {
            link.close();
            info!(
                "Drive link '{}' released after {} frames",
                self.name,
                self.frames_sent()
            );
        }
        if inner.down_reason.is_none() {
            inner.down_reason = Some("drive link released".to_string());
        }
    }

    /// Returns true while the link is open and has not failed.
    pub fn is_up(&self) -> bool {
        self.inner.lock().link.is_some()
    }

    /// Number of frames successfully handed to the link.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for DriveChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveChannel")
            .field("name", &self.name)
            .field("up", &self.is_up())
            .field("frames_sent", &self.frames_sent())
            .finish()
    }
}
