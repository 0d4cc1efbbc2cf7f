//! Command translation benchmarks.
//!
//! Measures the work done under the control-state lock for the commands
//! the ingest and telemetry loops issue most often.

use criterion::{Criterion, criterion_group, criterion_main};
use hermod_bridge::supervisor::SafetySupervisor;
use hermod_bridge::translator::{CommandTranslator, DriveLimits};
use hermod_common::control::command::{Command, ControlState};
use hermod_common::control::telemetry::TelemetrySample;
use std::hint::black_box;

fn bench_throttle(c: &mut Criterion) {
    let translator = CommandTranslator::new(1, DriveLimits::default());
    let mut state = ControlState::new(500.0);
    state.set_speed_limit_kmh(250.0);

    c.bench_function("translate_clamped_throttle", |b| {
        b.iter(|| translator.translate(black_box(Command::SetThrottle(45.0)), &mut state));
    });
}

fn bench_brake(c: &mut Criterion) {
    let translator = CommandTranslator::new(1, DriveLimits::default());
    let mut state = ControlState::new(500.0);

    c.bench_function("translate_brake", |b| {
        b.iter(|| translator.translate(black_box(Command::SetBrake(50.0)), &mut state));
    });
}

fn bench_safety_inspect(c: &mut Criterion) {
    let supervisor = SafetySupervisor::default();
    let sample = TelemetrySample::default()
        .with_speed(300.0)
        .with_temperature(45.0)
        .with_battery_temp(30.0)
        .with_brake_pressure(90.0);

    c.bench_function("safety_inspect", |b| {
        b.iter(|| supervisor.inspect(black_box(&sample)));
    });
}

criterion_group!(benches, bench_throttle, bench_brake, bench_safety_inspect);
criterion_main!(benches);
