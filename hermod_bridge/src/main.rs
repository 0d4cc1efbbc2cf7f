//! # Hermod Bridge Binary
//!
//! Relays sensor telemetry to the operator console, turns console commands
//! into inverter register writes and enforces the safety interlocks.
//!
//! # Usage
//!
//! ```bash
//! # Run against the real drive
//! hermod_bridge --config /etc/hermod/bridge.toml
//!
//! # Log frames instead of writing them to the drive
//! hermod_bridge --config bridge.toml --simulate
//!
//! # Verbose JSON logging
//! hermod_bridge -s -v --json
//! ```

use clap::Parser;
use hermod_bridge::engine::ControlEngine;
use hermod_bridge::error::EngineError;
use hermod_bridge::links::console;
use hermod_bridge::links::serial::{SerialDriveLink, SerialTelemetrySource};
use hermod_bridge::links::simulation::SimulatedDriveLink;
use hermod_common::config::{BridgeConfig, ConfigError, ConfigLoader, LogLevel};
use hermod_common::consts::DEFAULT_CONFIG_PATH;
use hermod_common::drive::link::DriveLink;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Hermod Bridge - telemetry relay and safety interlock for the motor drive
#[derive(Parser, Debug)]
#[command(name = "hermod_bridge")]
#[command(version)]
#[command(about = "Telemetry relay, command translation and safety interlock for the motor drive")]
#[command(long_about = None)]
struct Args {
    /// Path to the bridge configuration file (bridge.toml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use the simulated drive instead of the serial inverter link
    #[arg(short = 's', long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Bridge startup failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EngineError> {
    let args = Args::parse();

    // Config first so its log level applies; tracing is not up yet.
    let (config, defaulted) = match BridgeConfig::load(&args.config) {
        Ok(config) => (config, false),
        // Only the default location may be absent.
        Err(ConfigError::FileNotFound) if args.config.as_os_str() == DEFAULT_CONFIG_PATH => {
            (BridgeConfig::default(), true)
        }
        Err(e) => {
            eprintln!("hermod_bridge: cannot load {}: {}", args.config.display(), e);
            return Err(e.into());
        }
    };
    setup_tracing(&args, config.shared.log_level);
    if defaulted {
        warn!("No config at {}, using built-in defaults", DEFAULT_CONFIG_PATH);
    }
    config.validate()?;

    info!(
        "{} v{} starting (config {:?})",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        args.config
    );

    // Links come up in a fixed order: sensor, drive, console.
    let mut sensor = SerialTelemetrySource::open(&config.sensor)
        .map_err(|e| EngineError::Startup(format!("sensor link: {e}")))?;

    let drive: Box<dyn DriveLink> = if args.simulate {
        info!("Simulation mode enabled: drive frames are logged, not sent");
        let (link, _) = SimulatedDriveLink::new();
        Box::new(link)
    } else {
        Box::new(
            SerialDriveLink::open(&config.drive)
                .map_err(|e| EngineError::Startup(format!("drive link: {e}")))?,
        )
    };

    let (sink, mut commands) = console::connect(&config.console)
        .map_err(|e| EngineError::Startup(format!("console link: {e}")))?;

    let engine = ControlEngine::new(&config, drive, Box::new(sink))?;

    let running = engine.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|e| EngineError::Startup(format!("signal handler: {e}")))?;

    if let Err(e) = engine.run(&mut sensor, &mut commands) {
        error!("Control loop error: {}", e);
    }
    engine.shutdown();

    if sensor.malformed_count() > 0 {
        warn!("{} malformed sensor lines dropped", sensor.malformed_count());
    }
    info!("Hermod Bridge shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let level = if args.verbose { "debug" } else { level.as_str() };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
