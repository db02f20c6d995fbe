use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Frame counter shared between the renderer and the control side.
///
/// The renderer advances it after every block; the control side reads it to
/// stamp automation events. Reads never block and never wait on rendering.
#[derive(Debug, Clone)]
pub struct AudioClock {
    frames: Arc<AtomicU64>,
    sample_rate: f32,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Current audio time in seconds.
    pub fn now(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    pub fn advance(&self, frames: usize) {
        self.frames.fetch_add(frames as u64, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_counter() {
        let clock = AudioClock::new(48_000.0);
        let reader = clock.clone();

        clock.advance(24_000);
        assert_eq!(reader.frames(), 24_000);
        assert!((reader.now() - 0.5).abs() < 1e-12);
    }
}
