//! Benchmarks for the shared bus under polyphony.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fretwork::config::EngineConfig;
use fretwork::error::SampleError;
use fretwork::io::sample::ExcitationSample;
use fretwork::synth::engine::FretEngine;

use crate::BLOCK_SIZES;

fn pluck() -> Result<ExcitationSample, SampleError> {
    let samples = (0..48_000 * 60)
        .map(|i| {
            let t = i as f32 / 48_000.0;
            (2.0 * std::f32::consts::PI * 82.41 * t).sin() * (-t * 0.1).exp()
        })
        .collect();
    ExcitationSample::new(samples, 48_000, 82.41)
}

pub fn bench_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/bus");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === OPEN E MAJOR CHORD ===
        // Six voices with bends in flight on two of them
        let (mut engine, mut bus, mut scope) =
            FretEngine::new(EngineConfig::default(), 48_000.0, pluck).expect("engine");
        for (string, fret) in [0, 2, 2, 1, 0, 0].into_iter().enumerate() {
            let position = engine.position(string, fret).expect("on the neck");
            engine.create(position, string as u64).expect("voice");
        }
        engine.update_pitch(&3u64.into(), 0.0, 1.0);
        engine.update_pitch(&4u64.into(), 0.0, 0.5);

        group.bench_with_input(BenchmarkId::new("chord", size), &size, |b, _| {
            b.iter(|| {
                bus.render_block(black_box(&mut buffer), None);
                scope.poll();
            })
        });
    }

    group.finish();
}
