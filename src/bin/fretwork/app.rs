//! Fretwork - audio device setup and the excitation source

use std::{path::PathBuf, sync::Arc, thread};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info, warn};

use fretwork::{
    config::EngineConfig,
    dsp::distortion::hard_clip,
    error::SampleError,
    io::sample::{ExcitationSample, SampleCache, WavLoader},
    FretEngine, MAX_BLOCK_SIZE,
};

use super::ui::UiApp;

/// Main application: owns the configuration until `run` takes over
pub struct Fretwork {
    sample: Option<PathBuf>,
    config: EngineConfig,
}

impl Fretwork {
    pub fn new(sample: Option<PathBuf>) -> Self {
        Self {
            sample,
            config: EngineConfig::default(),
        }
    }

    /// Open the audio device, start the engine and hand the terminal to the UI
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!(target: "fretwork::app", "output at {} Hz, {} channels", sample_rate, channels);

        let cache = Arc::new(self.sample_cache());
        let (engine, mut bus, scope) =
            FretEngine::with_cache(self.config, sample_rate, Arc::clone(&cache))
                .wrap_err("failed to start engine")?;

        // Warm the cache in the background; the first note waits on this same load
        thread::spawn(move || match cache.get_or_load() {
            Ok(sample) => info!(
                target: "fretwork::app",
                "excitation ready: {:.2}s at {} Hz",
                sample.duration_secs(),
                sample.sample_rate()
            ),
            Err(e) => warn!(target: "fretwork::app", "excitation load failed: {}", e),
        });

        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;

                    while frames_written < total_frames {
                        let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        let block = &mut render_buf[..frames_to_render];
                        bus.render_block(block, None);

                        // Mono to every channel
                        let out_off = frames_written * channels;
                        for (i, &s) in block.iter().enumerate() {
                            let s = hard_clip(s, 1.0);
                            for ch in 0..channels {
                                data[out_off + i * channels + ch] = s;
                            }
                        }

                        frames_written += frames_to_render;
                    }
                },
                |err| error!(target: "fretwork::app", "stream error: {}", err),
                None,
            )
            .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start output stream")?;

        let mut ui = UiApp::new(engine, scope, sample_rate);
        let mut terminal = ratatui::init();
        let result = ui.run(&mut terminal);
        ratatui::restore();

        drop(stream);
        result
    }

    fn sample_cache(&self) -> SampleCache {
        let fundamental = self.config.excitation_hz;
        let usable = self.config.usable_secs;

        match &self.sample {
            Some(path) => {
                info!(target: "fretwork::app", "excitation from {:?}", path);
                SampleCache::new(WavLoader::new(path.clone(), fundamental, usable))
            }
            None => {
                info!(target: "fretwork::app", "no clip given, synthesizing a pluck");
                SampleCache::new(move || synth_pluck(fundamental, usable))
            }
        }
    }
}

const PLUCK_SAMPLE_RATE: u32 = 48_000;

/// Karplus-Strong string: a burst of noise circulating through a delay line
/// one period long, averaged on every pass so the highs die first.
fn synth_pluck(fundamental_hz: f32, secs: f32) -> Result<ExcitationSample, SampleError> {
    if fundamental_hz <= 0.0 {
        return Err(SampleError::Loader(format!("bad fundamental {} Hz", fundamental_hz)));
    }

    let period = (PLUCK_SAMPLE_RATE as f32 / fundamental_hz).round().max(2.0) as usize;
    let frames = (secs.max(0.1) * PLUCK_SAMPLE_RATE as f32) as usize;

    // xorshift noise, fixed seed so every run sounds the same
    let mut state = 0x2545_f491_u32;
    let mut line: Vec<f32> = (0..period)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect();

    let mut out = Vec::with_capacity(frames);
    let mut idx = 0;
    for _ in 0..frames {
        let next = (idx + 1) % period;
        let value = line[idx];
        line[idx] = 0.996 * 0.5 * (line[idx] + line[next]);
        out.push(value * 0.7);
        idx = next;
    }

    ExcitationSample::new(out, PLUCK_SAMPLE_RATE, fundamental_hz)
}
