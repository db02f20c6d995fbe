//! Benchmarks for automation timelines.
//!
//! The gain and rate lanes are sampled once per frame, so their cost scales
//! with the number of live voices.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fretwork::config::EnvelopeConfig;
use fretwork::dsp::automation::{AutomationParam, ParamTimeline};
use fretwork::dsp::envelope::EnvelopeScheduler;

use crate::BLOCK_SIZES;

pub fn bench_automation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/automation");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Envelope mid-attack: set + two ramps
        let mut gain = AutomationParam::new(0.0);
        EnvelopeScheduler::start(&EnvelopeConfig::default(), &mut gain, 0.0);
        group.bench_with_input(BenchmarkId::new("envelope_attack", size), &size, |b, _| {
            b.iter(|| {
                gain.fill(black_box(&mut buffer), black_box(0.005), 48_000.0);
            })
        });

        // Pitch glide: exponential approach, evaluated with exp() per frame
        let mut rate = AutomationParam::new(1.0);
        rate.cancel_and_hold(0.0);
        rate.set_target_at(2.0, 0.0, 0.03);
        group.bench_with_input(BenchmarkId::new("bend_glide", size), &size, |b, _| {
            b.iter(|| {
                rate.fill(black_box(&mut buffer), black_box(0.01), 48_000.0);
            })
        });

        // Steady state: no events, constant fill
        let flat = AutomationParam::new(0.5);
        group.bench_with_input(BenchmarkId::new("constant", size), &size, |b, _| {
            b.iter(|| {
                flat.fill(black_box(&mut buffer), black_box(0.0), 48_000.0);
            })
        });
    }

    group.finish();
}
