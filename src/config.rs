//! Engine configuration.
//!
//! Everything the engine treats as a constant lives here: the tuning table,
//! the tonal reference for scale mode, envelope timings, the pitch smoothing
//! constant and the shared bus settings. Start from `EngineConfig::default()`
//! and override with the `with_*` builders.
//!
//! ```ignore
//! let config = EngineConfig::default()
//!     .with_open_strings([73.42, 110.0, 146.83, 196.0, 246.94, 329.63]) // drop D
//!     .with_release(0.5);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::instrument::tuning::STRING_COUNT;

/// Recorded fundamental of the bundled excitation clip (low E, 82.41 Hz).
pub const DEFAULT_EXCITATION_HZ: f32 = 82.41;

/// Standard guitar tuning, string 0 is the low E.
pub const STANDARD_TUNING: [f32; STRING_COUNT] = [82.41, 110.00, 146.83, 196.00, 246.94, 329.63];

/// Minor pentatonic residues relative to the tonal reference.
pub const PENTATONIC_MINOR: [u8; 5] = [0, 3, 5, 7, 10];

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeConfig {
    /// Seconds to ramp 0 → peak
    pub attack_secs: f32,
    pub peak_level: f32,
    /// Seconds to ramp peak → sustain
    pub decay_secs: f32,
    pub sustain_level: f32,
    /// Seconds to ramp current level → 0 after note-off
    pub release_secs: f32,
    /// Extra time after the release before playback is stopped
    pub stop_tail_secs: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack_secs: 0.01,
            peak_level: 0.8,
            decay_secs: 0.25,
            sustain_level: 0.5,
            release_secs: 0.3,
            stop_tail_secs: 0.05,
        }
    }
}

/// Per-voice tone shaping: high pass then low pass.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ToneConfig {
    pub highpass_hz: f32,
    pub lowpass_hz: f32,
    pub resonance: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            highpass_hz: 70.0,
            lowpass_hz: 4000.0,
            resonance: 0.1,
        }
    }
}

/// Shared output bus: master gain into soft-clip distortion.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BusConfig {
    pub master_gain: f32,
    pub drive: f32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            master_gain: 0.8,
            drive: 1.5,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Open-string frequencies in Hz
    pub open_strings: [f32; STRING_COUNT],
    /// Highest playable fret (inclusive)
    pub fret_count: usize,
    /// Tonal center for scale mode (semitone 0)
    pub reference_hz: f32,
    /// Allowed residues mod 12, in tie-break order
    pub scale_degrees: Vec<u8>,
    /// Recorded fundamental of the excitation clip
    pub excitation_hz: f32,
    /// Leading window of the clip kept after decoding
    pub usable_secs: f32,
    pub envelope: EnvelopeConfig,
    /// Time constant of the exponential pitch glide, in seconds
    pub bend_time_constant: f32,
    /// How far past the audio clock note-on, bend and note-off events are
    /// stamped. Must cover one device buffer, or the audio side picks events
    /// up after their start time has already passed.
    pub schedule_ahead_secs: f32,
    pub tone: ToneConfig,
    pub bus: BusConfig,
    /// Capacity of the engine → bus command ring
    pub command_queue: usize,
    /// Capacity of each voice's automation ring
    pub voice_queue: usize,
    /// Capacity of the bus → visualizer sample ring
    pub scope_queue: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            open_strings: STANDARD_TUNING,
            fret_count: 15,
            reference_hz: 82.41,
            scale_degrees: PENTATONIC_MINOR.to_vec(),
            excitation_hz: DEFAULT_EXCITATION_HZ,
            usable_secs: 3.0,
            envelope: EnvelopeConfig::default(),
            bend_time_constant: 0.03,
            schedule_ahead_secs: 0.02,
            tone: ToneConfig::default(),
            bus: BusConfig::default(),
            command_queue: 256,
            voice_queue: 128,
            scope_queue: 8192,
        }
    }
}

impl EngineConfig {
    pub fn with_open_strings(mut self, open_strings: [f32; STRING_COUNT]) -> Self {
        self.open_strings = open_strings;
        self
    }

    pub fn with_fret_count(mut self, fret_count: usize) -> Self {
        self.fret_count = fret_count;
        self
    }

    pub fn with_reference_hz(mut self, reference_hz: f32) -> Self {
        self.reference_hz = reference_hz;
        self
    }

    pub fn with_scale_degrees(mut self, degrees: &[u8]) -> Self {
        self.scale_degrees = degrees.iter().map(|d| d % 12).collect();
        self
    }

    pub fn with_excitation_hz(mut self, excitation_hz: f32) -> Self {
        self.excitation_hz = excitation_hz;
        self
    }

    pub fn with_envelope(mut self, envelope: EnvelopeConfig) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_release(mut self, release_secs: f32) -> Self {
        self.envelope.release_secs = release_secs;
        self
    }

    pub fn with_bend_time_constant(mut self, seconds: f32) -> Self {
        self.bend_time_constant = seconds;
        self
    }

    /// Zero suits offline rendering, where the caller alternates control
    /// calls and `render_block` itself.
    pub fn with_schedule_ahead(mut self, seconds: f32) -> Self {
        self.schedule_ahead_secs = seconds.max(0.0);
        self
    }

    pub fn with_tone(mut self, tone: ToneConfig) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }
}
