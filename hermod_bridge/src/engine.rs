//! Control engine and loop management.
//!
//! `ControlEngine` ties the links to the translator and the safety
//! supervisor. `run()` drives two activities until shutdown:
//!
//! - the telemetry loop (calling thread): read a sample, enforce the safety
//!   rules, forward the sample to the console, sleep out the poll period;
//! - the command-ingest loop (scoped thread): read console lines, translate
//!   and transmit them.
//!
//! Both activities reach the drive through the same `DriveChannel`, so a
//! safety override and an operator command can never interleave their
//! frames. The speed limit lock is always released before the drive lock
//! is taken.

use crate::channel::DriveChannel;
use crate::error::EngineError;
use crate::links::console::{Notification, sample_line};
use crate::links::{CommandSource, ConsoleSink, TelemetrySource};
use crate::message::parse_command;
use crate::supervisor::SafetySupervisor;
use crate::translator::{CommandTranslator, TranslationResult};
use hermod_common::config::BridgeConfig;
use hermod_common::control::command::{Command, CommandOrigin, ControlState};
use hermod_common::control::safety::SafetyTrip;
use hermod_common::drive::link::{DriveLink, TransportError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Speed limit shared by the telemetry and command activities.
pub type SharedControlState = Arc<Mutex<ControlState>>;

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, loops not started.
    Uninitialized,
    /// Loops running.
    Running,
    /// Final stop in progress.
    ShuttingDown,
    /// Drive link released. Terminal.
    Stopped,
}

/// Telemetry loop timing statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingStats {
    /// Number of cycles executed
    pub cycle_count: u64,
    /// Cycles that exceeded the poll period
    pub timing_violations: u64,
    /// Maximum observed cycle time
    pub max_cycle_time_us: u64,
    /// Sum of cycle times for average calculation
    pub total_cycle_time_us: u64,
}

impl TimingStats {
    /// Mean cycle time [us].
    pub fn avg_cycle_time_us(&self) -> u64 {
        self.total_cycle_time_us
            .checked_div(self.cycle_count)
            .unwrap_or(0)
    }

    fn record(&mut self, cycle_time_us: u64, target_us: u64) -> bool {
        self.cycle_count += 1;
        self.total_cycle_time_us += cycle_time_us;
        self.max_cycle_time_us = self.max_cycle_time_us.max(cycle_time_us);
        if cycle_time_us > target_us {
            self.timing_violations += 1;
            return true;
        }
        false
    }
}

/// First ten occurrences, then every thousandth.
#[inline]
fn should_log(count: u64) -> bool {
    count <= 10 || count % 1000 == 0
}

/// The bridge's control core.
pub struct ControlEngine {
    state: SharedControlState,
    drive: Arc<DriveChannel>,
    translator: CommandTranslator,
    supervisor: SafetySupervisor,
    console: Mutex<Box<dyn ConsoleSink>>,
    running: Arc<AtomicBool>,
    lifecycle: Mutex<EngineState>,
    poll_period: Duration,
    stats: Mutex<TimingStats>,
    sensor_errors: AtomicU64,
    drive_errors: AtomicU64,
    console_errors: AtomicU64,
    sensor_down: AtomicBool,
    drive_down_reported: AtomicBool,
}

impl ControlEngine {
    /// Create an engine over opened drive and console links.
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the configuration fails validation.
    pub fn new(
        config: &BridgeConfig,
        drive: Box<dyn DriveLink>,
        console: Box<dyn ConsoleSink>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let translator =
            CommandTranslator::new(config.drive.slave_address, config.limits.into());
        let state = ControlState::new(config.limits.max_system_speed_kmh);

        info!(
            "ControlEngine created: drive='{}' slave={}, console='{}', poll={}ms, limit={} km/h",
            drive.name(),
            config.drive.slave_address,
            console.name(),
            config.engine.poll_period_ms,
            state.speed_limit_kmh()
        );

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            drive: Arc::new(DriveChannel::new(drive)),
            translator,
            supervisor: SafetySupervisor::new(config.safety),
            console: Mutex::new(console),
            running: Arc::new(AtomicBool::new(true)),
            lifecycle: Mutex::new(EngineState::Uninitialized),
            poll_period: config.engine.poll_period(),
            stats: Mutex::new(TimingStats::default()),
            sensor_errors: AtomicU64::new(0),
            drive_errors: AtomicU64::new(0),
            console_errors: AtomicU64::new(0),
            sensor_down: AtomicBool::new(false),
            drive_down_reported: AtomicBool::new(false),
        })
    }

    /// Translate and transmit one command.
    ///
    /// The state lock is held only for translation. A clamped throttle is
    /// reported to the console before its frame is sent.
    ///
    /// # Errors
    /// - `EngineError::Command` if the value cannot be translated
    /// - `EngineError::Transport` if the drive write failed
    pub fn handle_command(
        &self,
        cmd: Command,
        origin: CommandOrigin,
    ) -> Result<TranslationResult, EngineError> {
        let translated = {
            let mut state = self.state.lock();
            self.translator.translate(cmd, &mut state)
        };

        let result = match translated {
            Ok(result) => result,
            Err(e) => {
                warn!(?origin, "Dropping {}: {}", cmd, e);
                return Err(e.into());
            }
        };

        if let Some(clamp) = result.clamped {
            warn!(?origin, "{}", result.summary);
            self.notify(&Notification::ThrottleClamped {
                requested_hz: clamp.requested_hz,
                applied_hz: clamp.applied_hz,
                speed_limit_kmh: clamp.speed_limit_kmh,
            });
        }

        if !result.frames.is_empty() {
            if let Err(e) = self.drive.transmit(&result.frames) {
                self.on_drive_failure(cmd, origin, &e);
                return Err(e.into());
            }
        }

        if result.clamped.is_none() {
            info!(?origin, "{}", result.summary);
        }
        Ok(result)
    }

    /// Parse and execute one operator console line.
    ///
    /// Rejected lines are logged at debug level and returned as
    /// `EngineError::Message`.
    pub fn handle_message(&self, line: &str) -> Result<TranslationResult, EngineError> {
        let cmd = parse_command(line).map_err(|e| {
            debug!("Dropping console line {:?}: {}", line, e);
            e
        })?;
        debug!("<- console {}", cmd);
        self.handle_command(cmd, CommandOrigin::Operator)
    }

    /// One telemetry cycle: read, enforce, forward.
    ///
    /// Reads at most one sample. A sensor that reports faster than the
    /// poll period queues up in the link and is worked through in order.
    ///
    /// Returns the rules tripped by the sample (empty when no sample
    /// arrived). Override delivery failures are logged and reported to the
    /// console; the sample is forwarded regardless.
    ///
    /// # Errors
    /// Returns the sensor link's `TransportError`.
    pub fn telemetry_cycle(
        &self,
        source: &mut dyn TelemetrySource,
    ) -> Result<SafetyTrip, TransportError> {
        let Some(sample) = source.next_sample()? else {
            return Ok(SafetyTrip::empty());
        };

        let mut trips = SafetyTrip::empty();
        for o in self.supervisor.inspect(&sample) {
            trips |= o.trip;
            warn!(
                "Safety override: {} ({} > {}) -> {}",
                o.trip.label(),
                o.reading,
                o.threshold,
                o.command
            );
            let delivered = self.handle_command(o.command, CommandOrigin::Safety).is_ok();
            self.notify(&Notification::SafetyOverride {
                rule: o.trip.label(),
                reading: o.reading,
                threshold: o.threshold,
                command: o.command,
                delivered,
            });
        }

        match sample_line(&sample) {
            Ok(line) => self.send_line(&line),
            Err(e) => warn!("Failed to encode sample: {}", e),
        }
        Ok(trips)
    }

    /// Run both loops until the running flag clears, then shut down.
    ///
    /// Blocks the calling thread. The flag is cleared by the signal handler
    /// (see `running_flag()`) or by the console disconnecting. If it was
    /// cleared before this call, the loops are skipped and the final stop
    /// is still sent.
    pub fn run(
        &self,
        sensor: &mut dyn TelemetrySource,
        commands: &mut dyn CommandSource,
    ) -> Result<(), EngineError> {
        {
            let lifecycle = *self.lifecycle.lock();
            if lifecycle != EngineState::Uninitialized {
                return Err(EngineError::Startup(format!(
                    "engine cannot start from {lifecycle:?}"
                )));
            }
        }
        self.set_lifecycle(EngineState::Running);
        if !self.running.load(Ordering::SeqCst) {
            info!("Shutdown requested before start");
        }

        if detect_rt_mode() {
            info!("Running in real-time mode");
        } else {
            info!("Running in standard (non-RT) mode");
        }
        info!(
            "Starting loops: sensor='{}', commands='{}', poll={}ms",
            sensor.name(),
            commands.name(),
            self.poll_period.as_millis()
        );

        std::thread::scope(|s| {
            let ingest = s.spawn(|| self.ingest_loop(commands));
            self.telemetry_loop(sensor);
            self.running.store(false, Ordering::SeqCst);
            if ingest.join().is_err() {
                error!("Command ingest thread panicked");
            }
        });

        self.shutdown();
        Ok(())
    }

    /// Stop the loops, send a final `Stop` and release the drive.
    ///
    /// Idempotent. A failed final stop is logged, never returned.
    pub fn shutdown(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if matches!(*lifecycle, EngineState::ShuttingDown | EngineState::Stopped) {
                return;
            }
            info!("Engine state: {:?} -> {:?}", *lifecycle, EngineState::ShuttingDown);
            *lifecycle = EngineState::ShuttingDown;
        }
        self.running.store(false, Ordering::SeqCst);

        match self.handle_command(Command::Stop, CommandOrigin::Shutdown) {
            Ok(_) => info!("Final stop sent"),
            Err(e) => warn!("Final stop not delivered: {}", e),
        }

        self.notify(&Notification::Shutdown {
            frames_sent: self.drive.frames_sent(),
        });
        self.drive.release();

        let stats = self.stats();
        info!(
            "Engine stopped after {} cycles (avg={}us, max={}us, violations={})",
            stats.cycle_count,
            stats.avg_cycle_time_us(),
            stats.max_cycle_time_us,
            stats.timing_violations
        );
        self.set_lifecycle(EngineState::Stopped);
    }

    /// Get the running flag for signal handlers.
    ///
    /// Set from construction, so a handler installed before `run()` never
    /// loses a request.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> EngineState {
        *self.lifecycle.lock()
    }

    /// Snapshot of the control state.
    pub fn control_state(&self) -> ControlState {
        *self.state.lock()
    }

    /// Shared handle to the control state.
    pub fn shared_state(&self) -> SharedControlState {
        Arc::clone(&self.state)
    }

    /// The drive channel.
    pub fn drive(&self) -> &DriveChannel {
        &self.drive
    }

    /// Get timing statistics.
    pub fn stats(&self) -> TimingStats {
        *self.stats.lock()
    }

    fn telemetry_loop(&self, sensor: &mut dyn TelemetrySource) {
        let target_us = self.poll_period.as_micros() as u64;

        while self.running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();

            match self.telemetry_cycle(sensor) {
                Ok(_) => {
                    if self.sensor_down.swap(false, Ordering::SeqCst) {
                        info!("Sensor link '{}' delivering again", sensor.name());
                    }
                }
                Err(e) => self.on_sensor_failure(sensor.name(), &e),
            }

            let cycle_time_us = cycle_start.elapsed().as_micros() as u64;
            let stats = {
                let mut stats = self.stats.lock();
                if stats.record(cycle_time_us, target_us) && should_log(stats.timing_violations) {
                    warn!(
                        "Timing violation #{}: cycle took {}us (target {}us)",
                        stats.timing_violations, cycle_time_us, target_us
                    );
                }
                *stats
            };

            if stats.cycle_count % 1000 == 0 {
                debug!(
                    "Telemetry loop: {} cycles, avg={}us, max={}us, violations={}",
                    stats.cycle_count,
                    stats.avg_cycle_time_us(),
                    stats.max_cycle_time_us,
                    stats.timing_violations
                );
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.poll_period {
                std::thread::sleep(self.poll_period - elapsed);
            }
        }
        debug!("Telemetry loop exited");
    }

    fn ingest_loop(&self, commands: &mut dyn CommandSource) {
        while self.running.load(Ordering::SeqCst) {
            match commands.next_line() {
                Ok(None) => {}
                Ok(Some(line)) => {
                    // Errors are logged where they occur.
                    let _ = self.handle_message(&line);
                }
                Err(e) => {
                    warn!("Console '{}' disconnected: {}", commands.name(), e);
                    self.running.store(false, Ordering::SeqCst);
                }
            }
        }
        debug!("Command ingest loop exited");
    }

    fn on_sensor_failure(&self, name: &str, err: &TransportError) {
        let count = self.sensor_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if should_log(count) {
            error!("Sensor link '{}' failure #{}: {}", name, count, err);
        }
        if !self.sensor_down.swap(true, Ordering::SeqCst) {
            self.notify(&Notification::SensorLinkDown {
                reason: err.to_string(),
            });
        }
    }

    fn on_drive_failure(&self, cmd: Command, origin: CommandOrigin, err: &TransportError) {
        let count = self.drive_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if should_log(count) {
            error!(?origin, "Drive write #{} for {} failed: {}", count, cmd, err);
        }
        if !self.drive_down_reported.swap(true, Ordering::SeqCst) {
            self.notify(&Notification::DriveLinkDown {
                command: cmd,
                origin,
                reason: err.to_string(),
            });
        }
    }

    fn notify(&self, notification: &Notification) {
        match notification.to_line() {
            Ok(line) => self.send_line(&line),
            Err(e) => warn!("Failed to encode notification: {}", e),
        }
    }

    fn send_line(&self, line: &str) {
        let result = self.console.lock().write_line(line);
        if let Err(e) = result {
            let count = self.console_errors.fetch_add(1, Ordering::Relaxed) + 1;
            if should_log(count) {
                warn!("Console write #{} failed: {}", count, e);
            }
        }
    }

    fn set_lifecycle(&self, next: EngineState) {
        let mut lifecycle = self.lifecycle.lock();
        info!("Engine state: {:?} -> {:?}", *lifecycle, next);
        *lifecycle = next;
    }
}

impl Drop for ControlEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Detect if running in real-time mode by checking scheduler policy.
fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        // SAFETY: sched_getscheduler(0) only queries the calling thread.
        unsafe {
            let policy = sched_getscheduler(0);
            policy == SCHED_FIFO || policy == SCHED_RR
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}
