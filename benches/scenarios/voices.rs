//! Benchmarks for a complete voice chain.
//!
//! player → high pass → low pass → gain, exactly as the engine builds it.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use fretwork::config::EngineConfig;
use fretwork::graph::node::RenderCtx;
use fretwork::instrument::tuning::FretPosition;
use fretwork::io::sample::ExcitationSample;
use fretwork::synth::voice::{Voice, VoiceKey, VoiceStart};

use crate::BLOCK_SIZES;

fn pluck() -> Arc<ExcitationSample> {
    // Long enough that no benchmark iteration runs off the end
    let samples = (0..48_000 * 60)
        .map(|i| {
            let t = i as f32 / 48_000.0;
            (2.0 * std::f32::consts::PI * 82.41 * t).sin() * (-t).exp()
        })
        .collect();
    Arc::new(ExcitationSample::new(samples, 48_000, 82.41).expect("non-empty clip"))
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let config = EngineConfig::default();
    let sample = pluck();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === SUSTAINED NOTE ===
        // The common case: envelope settled, no bend in flight
        let start = VoiceStart {
            position: FretPosition::new(0, 5, 15).expect("on the neck"),
            static_snap: 0.0,
            frequency: 110.0,
            playback_rate: 110.0 / 82.41,
        };
        let (_voice, mut node) =
            Voice::spawn("a".into(), VoiceKey::new(0), start, Arc::clone(&sample), &config, 0.0);
        let ctx = RenderCtx::at(48_000.0, 1.0);

        group.bench_with_input(BenchmarkId::new("sustained", size), &size, |b, _| {
            b.iter(|| {
                node.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // === ATTACK ===
        // Gain ramps evaluated every frame
        let (_voice, mut node) =
            Voice::spawn("b".into(), VoiceKey::new(1), start, Arc::clone(&sample), &config, 0.0);
        let ctx = RenderCtx::at(48_000.0, 0.0);

        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                node.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
