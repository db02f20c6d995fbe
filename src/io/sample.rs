//! The shared excitation sample.
//!
//! One pre-recorded pluck is the raw sound of every note; voices pitch it by
//! changing playback rate. It is fetched and decoded once, on first use, and
//! then shared read-only behind an `Arc` for the rest of the process.
//!
//! Loading is single-flight: while a load is in progress every other caller
//! waits for that same load instead of starting its own. A successful result
//! is cached forever; a failure is handed to everyone who waited on it and
//! then forgotten, so the next caller tries again.

use std::fs::File;
use std::io::{BufReader, Read};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::SampleError;

/// Decoded mono clip plus the fundamental it was recorded at.
#[derive(Debug, Clone)]
pub struct ExcitationSample {
    samples: Vec<f32>,
    sample_rate: u32,
    fundamental_hz: f32,
}

impl ExcitationSample {
    pub fn new(samples: Vec<f32>, sample_rate: u32, fundamental_hz: f32) -> Result<Self, SampleError> {
        if samples.is_empty() || sample_rate == 0 {
            return Err(SampleError::Empty);
        }
        Ok(Self {
            samples,
            sample_rate,
            fundamental_hz,
        })
    }

    /// Decode a WAV stream, keeping only the leading `usable_secs`.
    ///
    /// Integer PCM is scaled to [-1, 1]; multi-channel audio is averaged to mono.
    pub fn decode_wav<R: Read>(
        source: R,
        fundamental_hz: f32,
        usable_secs: f32,
    ) -> Result<Self, SampleError> {
        let mut reader = hound::WavReader::new(source)?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let max_frames = if usable_secs > 0.0 {
            (usable_secs * spec.sample_rate as f32).ceil() as usize
        } else {
            usize::MAX / channels
        };
        let max_samples = max_frames.saturating_mul(channels);

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .take(max_samples)
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .take(max_samples)
                .collect::<Result<_, _>>()?,
        };

        let mono = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Self::new(mono, spec.sample_rate, fundamental_hz)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn fundamental_hz(&self) -> f32 {
        self.fundamental_hz
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Linearly interpolated read at a fractional frame. `None` past the end.
    #[inline]
    pub fn read(&self, position: f64) -> Option<f32> {
        if position < 0.0 {
            return None;
        }
        let idx = position as usize;
        let a = *self.samples.get(idx)?;
        let b = self.samples.get(idx + 1).copied().unwrap_or(0.0);
        let frac = (position - idx as f64) as f32;
        Some(a + (b - a) * frac)
    }
}

/// Fetches and decodes the excitation clip.
pub trait SampleLoader: Send + Sync {
    fn load(&self) -> Result<ExcitationSample, SampleError>;
}

impl<F> SampleLoader for F
where
    F: Fn() -> Result<ExcitationSample, SampleError> + Send + Sync,
{
    fn load(&self) -> Result<ExcitationSample, SampleError> {
        self()
    }
}

/// Loads the clip from a WAV file on disk.
#[derive(Debug, Clone)]
pub struct WavLoader {
    path: PathBuf,
    fundamental_hz: f32,
    usable_secs: f32,
}

impl WavLoader {
    pub fn new(path: impl Into<PathBuf>, fundamental_hz: f32, usable_secs: f32) -> Self {
        Self {
            path: path.into(),
            fundamental_hz,
            usable_secs,
        }
    }
}

impl SampleLoader for WavLoader {
    fn load(&self) -> Result<ExcitationSample, SampleError> {
        log::debug!(target: "fretwork::sample", "decoding {:?}", self.path);
        let file = File::open(&self.path)?;
        ExcitationSample::decode_wav(BufReader::new(file), self.fundamental_hz, self.usable_secs)
    }
}

enum Slot {
    Empty,
    Loading,
    Ready(Arc<ExcitationSample>),
}

struct CacheState {
    slot: Slot,
    // Bumped when a load attempt finishes, so waiters can tell their attempt apart
    attempt: u64,
    last_error: Option<(u64, SampleError)>,
}

pub struct SampleCache {
    loader: Box<dyn SampleLoader>,
    state: Mutex<CacheState>,
    settled: Condvar,
    loads: AtomicUsize,
}

impl SampleCache {
    pub fn new<L: SampleLoader + 'static>(loader: L) -> Self {
        Self {
            loader: Box::new(loader),
            state: Mutex::new(CacheState {
                slot: Slot::Empty,
                attempt: 0,
                last_error: None,
            }),
            settled: Condvar::new(),
            loads: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached sample, loading it first if nobody has yet.
    ///
    /// Blocks while a load is in flight, whether started by this caller or
    /// another one.
    pub fn get_or_load(&self) -> Result<Arc<ExcitationSample>, SampleError> {
        let mut state = self.lock();
        loop {
            let waiting_on = match &state.slot {
                Slot::Ready(sample) => return Ok(Arc::clone(sample)),
                Slot::Empty => break,
                Slot::Loading => state.attempt,
            };

            state = self
                .settled
                .wait_while(state, |s| matches!(s.slot, Slot::Loading) && s.attempt == waiting_on)
                .unwrap_or_else(PoisonError::into_inner);

            if let (Slot::Empty, Some((attempt, err))) = (&state.slot, &state.last_error) {
                if *attempt == waiting_on {
                    return Err(err.clone());
                }
            }
        }

        state.slot = Slot::Loading;
        let attempt = state.attempt;
        drop(state);

        self.loads.fetch_add(1, Ordering::Relaxed);
        // A panicking loader must still settle the slot, or waiters hang forever
        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.loader.load())) {
            Ok(result) => result,
            Err(_) => Err(SampleError::Loader("excitation loader panicked".into())),
        };

        let mut state = self.lock();
        state.attempt += 1;
        let outcome = match result {
            Ok(sample) => {
                log::info!(
                    target: "fretwork::sample",
                    "excitation sample ready: {} frames @ {} Hz, fundamental {} Hz",
                    sample.len(),
                    sample.sample_rate(),
                    sample.fundamental_hz()
                );
                let sample = Arc::new(sample);
                state.slot = Slot::Ready(Arc::clone(&sample));
                state.last_error = None;
                Ok(sample)
            }
            Err(err) => {
                log::warn!(target: "fretwork::sample", "excitation sample failed to load: {}", err);
                state.slot = Slot::Empty;
                state.last_error = Some((attempt, err.clone()));
                Err(err)
            }
        };
        drop(state);

        self.settled.notify_all();
        outcome
    }

    /// The cached sample, if a load has already succeeded.
    pub fn peek(&self) -> Option<Arc<ExcitationSample>> {
        match &self.lock().slot {
            Slot::Ready(sample) => Some(Arc::clone(sample)),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.peek().is_some()
    }

    /// How many times the loader has actually been invoked.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}
