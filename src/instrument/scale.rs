use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::instrument::tuning::{FretPosition, StringTuning, STRING_COUNT};

/*
Scale Quantization
==================

With scale mode on, a drag should land on (or near) a note of the scale
rather than on an arbitrary microtone. Positions are measured in semitones
from a fixed tonal reference (semitone 0).

  offset[s]   semitones from the reference to open string s
  p           absolute position = offset[s] + fret + slide + bend
  mod         p folded into one octave, always in [0, 12)

For the minor pentatonic set {0, 3, 5, 7, 10}:

   mod:  0 . . 3 . 5 . 7 . . 10 .
         ●     ●   ●   ●      ●

The nearest degree is picked by plain distance within the octave. Ties go to
whichever degree comes first in the declared set, so 4.0 (equidistant from 3
and 5) always lands on 3.

  correction = degree - mod
  correction > 2   →  correction - 12
  correction < -2  →  correction + 12

The wrap keeps the snap local: a correction never jumps an octave for a
neighbouring fret. Corrections are always computed from the absolute target,
never accumulated, so a long drag cannot drift.
*/

/// Process-wide scale-mode toggle.
///
/// Cloning yields another handle to the same flag; collaborators hold a clone
/// and flip it, the engine reads it on every pitch computation.
#[derive(Debug, Clone, Default)]
pub struct ScaleMode(Arc<AtomicBool>);

impl ScaleMode {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }

    /// Flip the flag, returning the new state.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct ScaleQuantizer {
    degrees: Vec<f32>,
    string_offsets: [i32; STRING_COUNT],
}

impl ScaleQuantizer {
    pub fn new(tuning: &StringTuning, reference_hz: f32, degrees: &[u8]) -> Self {
        let mut string_offsets = [0; STRING_COUNT];
        for (string, offset) in string_offsets.iter_mut().enumerate() {
            *offset = tuning.open_offset(string, reference_hz);
        }

        Self {
            degrees: degrees.iter().map(|&d| f32::from(d % 12)).collect(),
            string_offsets,
        }
    }

    pub fn string_offset(&self, string: usize) -> i32 {
        self.string_offsets[string]
    }

    /// Absolute position of a fret with no bend applied.
    pub fn position_of(&self, position: FretPosition) -> f32 {
        (self.string_offsets[position.string()] + position.fret() as i32) as f32
    }

    /// Semitones to add to `absolute` to land on the nearest allowed degree.
    pub fn correction(&self, absolute: f32) -> f32 {
        let folded = absolute.rem_euclid(12.0);

        let mut nearest = None;
        let mut best = f32::INFINITY;
        for &degree in &self.degrees {
            let distance = (folded - degree).abs();
            if distance < best {
                best = distance;
                nearest = Some(degree);
            }
        }

        let Some(degree) = nearest else {
            return 0.0;
        };

        let mut correction = degree - folded;
        if correction > 2.0 {
            correction -= 12.0;
        } else if correction < -2.0 {
            correction += 12.0;
        }
        correction
    }

    /// Correction gated by the scale-mode flag.
    pub fn correction_if(&self, mode: &ScaleMode, absolute: f32) -> f32 {
        if mode.is_enabled() {
            self.correction(absolute)
        } else {
            0.0
        }
    }

    /// Snap applied at note-on, before any drag.
    pub fn static_snap(&self, position: FretPosition) -> f32 {
        self.correction(self.position_of(position))
    }

    /// Whether a fret already sits on a scale degree (fretboard markers).
    pub fn is_allowed(&self, position: FretPosition) -> bool {
        self.static_snap(position).abs() < f32::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PENTATONIC_MINOR, STANDARD_TUNING};

    fn quantizer() -> ScaleQuantizer {
        let tuning = StringTuning::new(STANDARD_TUNING).unwrap();
        ScaleQuantizer::new(&tuning, 82.41, &PENTATONIC_MINOR)
    }

    fn pos(string: usize, fret: usize) -> FretPosition {
        FretPosition::new(string, fret, 15).unwrap()
    }

    #[test]
    fn reference_string_first_fret_snaps_down() {
        let q = quantizer();
        assert_eq!(q.string_offset(0), 0);

        let p = q.position_of(pos(0, 1));
        let correction = q.correction(p);
        assert!((correction + 1.0).abs() < 1e-6);
        assert!((p + correction).abs() < 1e-6);
    }

    #[test]
    fn ties_resolve_to_first_declared_degree() {
        let q = quantizer();
        // 4 sits between 3 and 5, 1.5 between 0 and 3, 8.5 between 7 and 10
        for _ in 0..100 {
            assert!((q.correction(4.0) + 1.0).abs() < 1e-6);
            assert!((q.correction(1.5) + 1.5).abs() < 1e-6);
            assert!((q.correction(8.5) + 1.5).abs() < 1e-6);
        }
    }

    #[test]
    fn tie_break_follows_declaration_order_not_value() {
        let tuning = StringTuning::new(STANDARD_TUNING).unwrap();
        let q = ScaleQuantizer::new(&tuning, 82.41, &[5, 3]);
        assert!((q.correction(4.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn correction_stays_within_two_semitones() {
        let q = quantizer();
        let mut p = -48.0_f32;
        while p < 48.0 {
            let c = q.correction(p);
            assert!((-2.0..=2.0).contains(&c), "position {} corrected by {}", p, c);
            p += 0.05;
        }
    }

    #[test]
    fn negative_positions_fold_into_octave() {
        let q = quantizer();
        // -1 folds to 11, nearest degree 10
        assert!((q.correction(-1.0) + 1.0).abs() < 1e-6);
        // -12 folds to 0, already on a degree
        assert!(q.correction(-12.0).abs() < 1e-6);
    }

    #[test]
    fn wrap_keeps_snap_local_for_sparse_scales() {
        let tuning = StringTuning::new(STANDARD_TUNING).unwrap();
        // Only the root allowed: 11 would otherwise jump down by 11
        let q = ScaleQuantizer::new(&tuning, 82.41, &[0]);
        assert!((q.correction(11.0) - 1.0).abs() < 1e-6);
        // 6 is too far either way, the wrap pushes it up an octave
        assert!((q.correction(6.0) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn mode_off_passes_through() {
        let q = quantizer();
        let mode = ScaleMode::new(false);
        assert_eq!(q.correction_if(&mode, 1.0), 0.0);

        mode.set(true);
        assert!((q.correction_if(&mode, 1.0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn allowed_markers_match_pentatonic_frets() {
        let q = quantizer();
        let allowed: Vec<usize> = (0..=12).filter(|&f| q.is_allowed(pos(0, f))).collect();
        assert_eq!(allowed, vec![0, 3, 5, 7, 10, 12]);
    }

    #[test]
    fn toggle_flips_shared_flag() {
        let mode = ScaleMode::new(false);
        let other = mode.clone();
        assert!(mode.toggle());
        assert!(other.is_enabled());
        assert!(!other.toggle());
        assert!(!mode.is_enabled());
    }
}
