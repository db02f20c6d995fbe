//! Benchmarks for the state-variable tone filters.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fretwork::dsp::filter::SVFilter;
use fretwork::graph::node::RenderCtx;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::at(48_000.0, 0.0);

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Voice low pass at the default cutoff
        let mut filter = SVFilter::lowpass(4_000.0);
        filter.set_resonance(0.1);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Voice high pass at the default cutoff
        let mut filter = SVFilter::highpass(70.0);
        filter.set_resonance(0.1);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("highpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
