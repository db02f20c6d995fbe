use crate::error::{EngineError, EngineResult};

/*
Equal-Tempered Fretboard
========================

Each fret raises a string by one equal-tempered semitone. Twelve semitones
double the frequency, so one semitone multiplies it by the twelfth root of 2:

    f(string, fret) = open[string] × 2^(fret / 12)

  fret   ratio     low E (82.41 Hz)
  ----   -------   ----------------
   0     1.000      82.41
   5     1.335     110.00  (A)
   7     1.498     123.47  (B)
  12     2.000     164.82  (octave)

Bends and slides are just fractional semitones fed through the same formula,
which is why `frequency_at` takes an `f32`.
*/

pub const STRING_COUNT: usize = 6;

/// A validated (string, fret) pair on the fretboard.
///
/// Construct through [`FretPosition::new`] at the input boundary; everything
/// downstream assumes the indices are in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FretPosition {
    string: usize,
    fret: usize,
}

impl FretPosition {
    pub fn new(string: usize, fret: usize, fret_count: usize) -> EngineResult<Self> {
        if string >= STRING_COUNT || fret > fret_count {
            return Err(EngineError::OutOfRange { string, fret });
        }
        Ok(Self { string, fret })
    }

    pub fn string(&self) -> usize {
        self.string
    }

    pub fn fret(&self) -> usize {
        self.fret
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringTuning {
    open: [f32; STRING_COUNT],
}

impl StringTuning {
    /// Open strings need not ascend, but each must be a positive frequency.
    pub fn new(open: [f32; STRING_COUNT]) -> EngineResult<Self> {
        if let Some((string, &hz)) = open
            .iter()
            .enumerate()
            .find(|(_, hz)| !hz.is_finite() || **hz <= 0.0)
        {
            return Err(EngineError::InvalidTuning { string, hz });
        }
        Ok(Self { open })
    }

    pub fn open_frequency(&self, string: usize) -> f32 {
        self.open[string]
    }

    /// Target fundamental for a fretted note.
    pub fn frequency_for(&self, position: FretPosition) -> f32 {
        self.frequency_at(position.string, position.fret as f32)
    }

    /// Frequency `semitones` above the open string (fractional for bends).
    #[inline]
    pub fn frequency_at(&self, string: usize, semitones: f32) -> f32 {
        self.open[string] * 2.0_f32.powf(semitones / 12.0)
    }

    /// Whole semitones from `reference_hz` to the open string.
    pub fn open_offset(&self, string: usize, reference_hz: f32) -> i32 {
        (12.0 * (self.open[string] / reference_hz).log2()).round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STANDARD_TUNING;

    fn tuning() -> StringTuning {
        StringTuning::new(STANDARD_TUNING).unwrap()
    }

    fn pos(string: usize, fret: usize) -> FretPosition {
        FretPosition::new(string, fret, 15).unwrap()
    }

    #[test]
    fn fifth_fret_low_e_is_a() {
        let freq = tuning().frequency_for(pos(0, 5));
        // 82.41 × 2^(5/12) = 110.004
        assert!((freq - 110.004).abs() < 0.001, "got {}", freq);
        assert!((freq - 109.96).abs() < 0.05, "got {}", freq);
    }

    #[test]
    fn frequency_rises_with_every_fret() {
        let tuning = tuning();
        for string in 0..STRING_COUNT {
            for fret in 0..15 {
                let lower = tuning.frequency_for(pos(string, fret));
                let upper = tuning.frequency_for(pos(string, fret + 1));
                assert!(upper > lower, "string {} fret {}", string, fret);
            }
        }
    }

    #[test]
    fn twelve_frets_double_the_frequency() {
        let tuning = tuning();
        for string in 0..STRING_COUNT {
            for fret in 0..=3 {
                let base = tuning.frequency_for(pos(string, fret));
                let octave = tuning.frequency_for(pos(string, fret + 12));
                assert!((octave - 2.0 * base).abs() < 1e-3 * octave);
            }
        }
    }

    #[test]
    fn rejects_positions_off_the_neck() {
        assert!(FretPosition::new(6, 0, 15).is_err());
        assert!(FretPosition::new(0, 16, 15).is_err());
        assert!(FretPosition::new(5, 15, 15).is_ok());
    }

    #[test]
    fn tuning_need_not_ascend_but_must_be_positive() {
        let mut open = STANDARD_TUNING;
        open.swap(0, 5);
        assert!(StringTuning::new(open).is_ok());

        open[2] = 0.0;
        assert!(matches!(
            StringTuning::new(open),
            Err(EngineError::InvalidTuning { string: 2, .. })
        ));
    }

    #[test]
    fn open_offsets_follow_standard_intervals() {
        let tuning = tuning();
        let offsets: Vec<i32> = (0..STRING_COUNT)
            .map(|s| tuning.open_offset(s, 82.41))
            .collect();
        assert_eq!(offsets, vec![0, 5, 10, 15, 19, 24]);
    }
}
