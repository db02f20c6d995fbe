// Purpose - the audio clock and the excitation clip

/// Frame counter shared by the renderer and the control side.
pub mod clock;
/// Excitation clip decoding and the single-flight cache.
pub mod sample;

pub use clock::AudioClock;
pub use sample::{ExcitationSample, SampleCache, SampleLoader, WavLoader};
