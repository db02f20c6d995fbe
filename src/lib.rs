pub mod config; // Engine constants and builders
pub mod dsp;
pub mod error;
pub mod graph; // Audio-thread nodes and the shared bus
pub mod instrument; // Tuning and scale quantization
pub mod io;
pub mod synth; // Voices, bends and the engine context

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, SampleError};
pub use synth::{FretEngine, InputEvent, VoiceId};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
