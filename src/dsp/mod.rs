//! Low-level DSP and scheduling primitives used by the graph nodes.
//!
//! Nothing here knows about threads or rings. The filter and waveshaper are
//! plain per-sample math; the automation timeline and the envelope that
//! writes onto it are plain data, so the control side and the audio side can
//! each hold a copy.

/// Sample-accurate parameter timelines.
pub mod automation;
/// Soft and hard clipping transfer functions.
pub mod distortion;
/// Attack/decay/sustain/release scheduled onto a gain timeline.
pub mod envelope;
/// State-variable filter with low and high pass responses.
pub mod filter;

pub use envelope::EnvelopeState;
