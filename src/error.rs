//! Error types shared by the engine and the sample loader.

use std::fmt;
use std::sync::Arc;

/// Failure to fetch or decode the excitation sample.
///
/// Cloneable so every caller waiting on the same in-flight load receives the
/// same error.
#[derive(Debug, Clone)]
pub enum SampleError {
    /// The clip could not be read from its source.
    Io(Arc<std::io::Error>),
    /// The clip was read but is not a WAV file we understand.
    Decode(String),
    /// Decoding succeeded but produced no audio.
    Empty,
    /// A custom loader reported a failure.
    Loader(String),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Io(e) => write!(f, "failed to read excitation sample: {}", e),
            SampleError::Decode(msg) => write!(f, "failed to decode excitation sample: {}", msg),
            SampleError::Empty => write!(f, "excitation sample contains no audio"),
            SampleError::Loader(msg) => write!(f, "excitation loader failed: {}", msg),
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::Io(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SampleError {
    fn from(e: std::io::Error) -> Self {
        SampleError::Io(Arc::new(e))
    }
}

impl From<hound::Error> for SampleError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => SampleError::from(io),
            other => SampleError::Decode(other.to_string()),
        }
    }
}

/// Errors surfaced by [`FretEngine`](crate::synth::engine::FretEngine).
#[derive(Debug, Clone)]
pub enum EngineError {
    /// A string or fret index outside the instrument's range.
    OutOfRange { string: usize, fret: usize },
    /// An open-string frequency that is not a positive, finite number.
    InvalidTuning { string: usize, hz: f32 },
    /// The excitation sample could not be made available.
    Sample(SampleError),
    /// A pitch update carrying NaN or an infinity.
    InvalidBend { fret_offset: f32, bend_semitones: f32 },
    /// The command ring toward the bus is full; the audio side is not draining it.
    BusFull,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::OutOfRange { string, fret } => {
                write!(f, "string {} fret {} is outside the fretboard", string, fret)
            }
            EngineError::InvalidTuning { string, hz } => {
                write!(f, "open frequency {} Hz for string {} is not positive", hz, string)
            }
            EngineError::InvalidBend {
                fret_offset,
                bend_semitones,
            } => write!(
                f,
                "pitch update {} frets {} semitones is not finite",
                fret_offset, bend_semitones
            ),
            EngineError::Sample(e) => write!(f, "{}", e),
            EngineError::BusFull => write!(f, "bus command queue is full"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Sample(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SampleError> for EngineError {
    fn from(e: SampleError) -> Self {
        EngineError::Sample(e)
    }
}

pub type EngineResult<T = ()> = Result<T, EngineError>;
