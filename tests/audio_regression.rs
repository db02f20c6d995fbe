//! Offline rendering checks: the bus is driven directly, no audio device.

use std::sync::Arc;

use fretwork::{
    dsp::envelope::EnvelopeState,
    error::SampleError,
    graph::bus::MixBus,
    io::sample::ExcitationSample,
    EngineConfig, FretEngine, VoiceId,
};

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK: usize = 256;

fn pluck() -> Result<ExcitationSample, SampleError> {
    let samples = (0..48_000 * 3)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 82.41 * t).sin() * (-t * 1.5).exp()
        })
        .collect();
    ExcitationSample::new(samples, 48_000, 82.41)
}

fn render(bus: &mut MixBus, blocks: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(blocks * BLOCK);
    let mut block = [0.0f32; BLOCK];
    for _ in 0..blocks {
        bus.render_block(&mut block, None);
        out.extend_from_slice(&block);
    }
    out
}

fn id(name: &str) -> VoiceId {
    VoiceId::from(name)
}

// Control calls and renders alternate on one thread here, so nothing needs
// to be stamped ahead of the clock
fn offline() -> EngineConfig {
    EngineConfig::default().with_schedule_ahead(0.0)
}

#[test]
fn renders_silence_with_no_voices() {
    let (_engine, mut bus, _scope) =
        FretEngine::new(EngineConfig::default(), SAMPLE_RATE, pluck).unwrap();
    let out = render(&mut bus, 8);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn full_chord_stays_within_full_scale() {
    let (mut engine, mut bus, _scope) =
        FretEngine::new(EngineConfig::default(), SAMPLE_RATE, pluck).unwrap();
    for (string, fret) in [0, 2, 2, 1, 0, 0].into_iter().enumerate() {
        let position = engine.position(string, fret).unwrap();
        engine.create(position, string as u64).unwrap();
    }

    let out = render(&mut bus, 40);
    assert!(out.iter().any(|s| s.abs() > 0.05));
    assert!(out.iter().all(|s| s.abs() < 1.0));
}

#[test]
fn note_starts_from_silence() {
    let (mut engine, mut bus, _scope) =
        FretEngine::new(offline(), SAMPLE_RATE, pluck).unwrap();
    engine.create(engine.position(0, 5).unwrap(), "a").unwrap();

    let out = render(&mut bus, 1);
    assert!(out[0].abs() < 1e-6);
    // Attack is 10 ms, so the first block is still ramping
    let early = out[..32].iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let late = out[BLOCK - 32..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(early < late);
}

#[test]
fn note_created_mid_block_still_attacks_from_silence() {
    let (mut engine, mut bus, _scope) =
        FretEngine::new(EngineConfig::default(), SAMPLE_RATE, pluck).unwrap();
    render(&mut bus, 2);

    let due = engine.event_time();
    engine.create(engine.position(0, 0).unwrap(), "a").unwrap();
    // The audio thread finishes the 512-frame buffer it was already rendering
    // before it sees the new voice
    engine.clock().advance(512);

    let first_rendered = engine.now();
    assert!(first_rendered < due);
    let voice = engine.voice(&id("a")).unwrap();
    assert!(voice.gain_at(first_rendered).abs() < 1e-6);
    assert!(voice.gain_at(due).abs() < 1e-6);
    assert!(voice.gain_at(due + 0.002) < voice.gain_at(due + 0.008));

    let out = render(&mut bus, 20);
    let onset = out.iter().position(|&s| s != 0.0).unwrap();
    let onset_time = first_rendered + onset as f64 / f64::from(SAMPLE_RATE);
    assert!(onset_time >= due - 1e-9);
    assert!(out.iter().any(|s| s.abs() > 0.05));
}

#[test]
fn stop_mid_attack_releases_from_the_current_gain() {
    let (mut engine, mut bus, _scope) =
        FretEngine::new(offline(), SAMPLE_RATE, pluck).unwrap();
    engine.create(engine.position(0, 0).unwrap(), "a").unwrap();

    // One block is ~5.3 ms, about half way up the 10 ms attack
    render(&mut bus, 1);
    let now = engine.now();
    let voice = engine.voice(&id("a")).unwrap();
    assert_eq!(voice.envelope_state(now), EnvelopeState::Attacking);
    let before = voice.gain_at(now);
    assert!(before > 0.1 && before < 0.8);

    assert!(engine.stop(&id("a")));
    let released = engine.releasing().next().unwrap();
    assert_eq!(released.envelope_state(now), EnvelopeState::Releasing);
    assert!((released.gain_at(now) - before).abs() < 1e-6);

    // Falls monotonically from there, never back up toward the peak
    let mut last = before;
    for step in 1..=30 {
        let gain = released.gain_at(now + step as f64 * 0.01);
        assert!(gain <= last + 1e-6);
        last = gain;
    }
    assert!(last.abs() < 1e-6);
}

#[test]
fn stop_right_after_create_still_terminates() {
    let (mut engine, mut bus, _scope) =
        FretEngine::new(EngineConfig::default(), SAMPLE_RATE, pluck).unwrap();
    engine.create(engine.position(4, 3).unwrap(), "a").unwrap();
    assert!(engine.stop(&id("a")));

    // Release 0.3 s + tail 0.05 s is under 70 blocks
    let out = render(&mut bus, 80);
    assert_eq!(engine.reap(), 1);
    assert_eq!(engine.releasing_count(), 0);
    assert!(out[out.len() - BLOCK..].iter().all(|&s| s == 0.0));
}

#[test]
fn superseded_voice_releases_its_resources() {
    let (mut engine, mut bus, _scope) =
        FretEngine::new(EngineConfig::default(), SAMPLE_RATE, pluck).unwrap();
    engine.create(engine.position(0, 0).unwrap(), "a").unwrap();
    render(&mut bus, 4);

    let sample = engine.samples().peek().unwrap();
    // Cache, this test and the live voice's player
    assert_eq!(Arc::strong_count(&sample), 3);

    engine.create(engine.position(0, 7).unwrap(), "a").unwrap();
    assert_eq!(Arc::strong_count(&sample), 4);

    render(&mut bus, 1);
    assert_eq!(engine.reap(), 1);
    assert_eq!(Arc::strong_count(&sample), 3);
    assert_eq!(engine.voice_count(), 1);
    assert_eq!(bus.voice_count(), 1);
}

#[test]
fn bend_glides_without_jumping() {
    let (mut engine, mut bus, _scope) =
        FretEngine::new(EngineConfig::default(), SAMPLE_RATE, pluck).unwrap();
    engine.create(engine.position(2, 5).unwrap(), "a").unwrap();
    render(&mut bus, 20);

    let now = engine.now();
    let before = engine.voice(&id("a")).unwrap().rate_at(now);
    let target = engine.update_pitch(&id("a"), 0.0, 2.0).unwrap();

    let voice = engine.voice(&id("a")).unwrap();
    assert!((voice.rate_at(now) - before).abs() < 1e-6);
    assert!((voice.playback_rate() - target.playback_rate).abs() < 1e-6);
    assert!((voice.rate_at(now + 0.5) - target.playback_rate).abs() < 1e-3);

    // A second update cancels the first glide where it stands
    render(&mut bus, 1);
    let mid = engine.now();
    let mid_rate = engine.voice(&id("a")).unwrap().rate_at(mid);
    engine.update_pitch(&id("a"), 0.0, 0.0);
    let voice = engine.voice(&id("a")).unwrap();
    assert!((voice.rate_at(mid) - mid_rate).abs() < 1e-6);
    assert!((voice.rate_at(mid + 0.5) - before).abs() < 1e-3);
}

#[test]
fn held_note_past_clip_end_terminates_on_stop() {
    let short = || {
        let samples = vec![0.1f32; 4_800];
        ExcitationSample::new(samples, 48_000, 82.41)
    };
    let (mut engine, mut bus, _scope) =
        FretEngine::new(EngineConfig::default(), SAMPLE_RATE, short).unwrap();
    engine.create(engine.position(0, 0).unwrap(), "a").unwrap();

    // 0.1 s of clip at unity rate
    render(&mut bus, 30);
    assert_eq!(engine.reap(), 0);
    assert_eq!(bus.voice_count(), 0);
    assert!(engine.voice(&id("a")).unwrap().is_detached());

    assert!(engine.stop(&id("a")));
    assert_eq!(engine.releasing_count(), 0);
}
