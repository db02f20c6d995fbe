//! Bus waveshaping.
//!
//! Every voice lands on one shared bus that is pushed gently into a soft
//! clipper. Overlapping notes then saturate together instead of wrapping
//! past full scale.
//!
//! # Transfer functions
//!
//! Soft clip: `f(x) = x / (1 + |x|)`. Smooth, never exceeds ±1.
//!
//! Hard clip: `f(x) = clamp(x, -t, t)`. Only used as a last-resort limiter on
//! the device write.
//!
//! # Drive
//!
//!   1.0  = barely touched
//!   1.5  = default, light warmth on chords
//!   4.0+ = obvious overdrive

/// Soft clipping using x / (1 + |x|) transfer function.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Hard clipping at `threshold`.
#[inline]
pub fn hard_clip(sample: f32, threshold: f32) -> f32 {
    sample.clamp(-threshold, threshold)
}

pub fn soft_clip_buffer(buffer: &mut [f32], drive: f32) {
    for sample in buffer.iter_mut() {
        *sample = soft_clip(*sample, drive);
    }
}

pub fn hard_clip_buffer(buffer: &mut [f32], threshold: f32) {
    for sample in buffer.iter_mut() {
        *sample = hard_clip(*sample, threshold);
    }
}
