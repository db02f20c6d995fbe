//! Benchmarks for bus waveshaping.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fretwork::dsp::distortion;

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        // A few voices summed, peaking past full scale
        let input: Vec<f32> = (0..size).map(|i| 1.6 * (i as f32 * 0.1).sin()).collect();

        // Soft clip - the bus shaper
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("soft_clip", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                distortion::soft_clip_buffer(black_box(&mut buffer), black_box(1.5));
            })
        });

        // Hard clip - device-side limiter
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("hard_clip", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                distortion::hard_clip_buffer(black_box(&mut buffer), black_box(1.0));
            })
        });
    }

    group.finish();
}
