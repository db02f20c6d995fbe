use crate::{
    dsp::automation::ParamTimeline,
    instrument::{
        scale::{ScaleMode, ScaleQuantizer},
        tuning::{FretPosition, StringTuning},
    },
    synth::voice::Voice,
    MIN_TIME,
};

/*
Pitch Bends and Slides
======================

A drag reports its TOTAL displacement from where the note started, as a fret
offset (sliding along the string) plus a bend in semitones (pushing across
it). Positions are semitones above the tonal reference:

    p = string offset + fret + static snap + fret offset + bend

With scale mode on the whole of `p` is quantized, never the increment:

    p' = p + correction(p)

and the frequency stays anchored on the voice's own string:

    f = open[string] × 2^((p' − string offset) / 12)

The new playback rate is not jumped to. The rate lane is pinned at whatever
it is doing right now and then glides toward the target:

  rate
   2.0 ┤          ______________   ← target
       │       ╱‾
       │     ╱      τ = bend time constant
   1.0 ┤────●
       └────┴───────────────────→ audio clock
          update
*/

/// A computed pitch: semitone position and the frequency it sounds at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchTarget {
    /// Semitones above the tonal reference, after any correction
    pub position: f32,
    pub frequency: f32,
    pub playback_rate: f32,
}

pub struct PitchBendEngine {
    tuning: StringTuning,
    quantizer: ScaleQuantizer,
    excitation_hz: f32,
    time_constant: f32,
}

impl PitchBendEngine {
    pub fn new(
        tuning: StringTuning,
        quantizer: ScaleQuantizer,
        excitation_hz: f32,
        time_constant: f32,
    ) -> Self {
        Self {
            tuning,
            quantizer,
            excitation_hz,
            time_constant: time_constant.max(MIN_TIME),
        }
    }

    pub fn tuning(&self) -> &StringTuning {
        &self.tuning
    }

    pub fn quantizer(&self) -> &ScaleQuantizer {
        &self.quantizer
    }

    pub fn time_constant(&self) -> f32 {
        self.time_constant
    }

    /// Snap applied at note-on: the correction at the physical fret, or zero
    /// with scale mode off.
    pub fn static_snap(&self, mode: &ScaleMode, position: FretPosition) -> f32 {
        if mode.is_enabled() {
            self.quantizer.static_snap(position)
        } else {
            0.0
        }
    }

    /// Pitch for a note at `position` displaced by `delta` semitones.
    pub fn target(
        &self,
        mode: &ScaleMode,
        position: FretPosition,
        static_snap: f32,
        delta: f32,
    ) -> PitchTarget {
        let string = position.string();
        let offset = self.quantizer.string_offset(string) as f32;

        let requested = self.quantizer.position_of(position) + static_snap + delta;
        let corrected = requested + self.quantizer.correction_if(mode, requested);

        let frequency = self.tuning.frequency_at(string, corrected - offset);
        PitchTarget {
            position: corrected,
            frequency,
            playback_rate: frequency / self.excitation_hz,
        }
    }

    /// Pitch at note-on.
    pub fn initial(&self, mode: &ScaleMode, position: FretPosition) -> (f32, PitchTarget) {
        let snap = self.static_snap(mode, position);
        let string = position.string();
        let offset = self.quantizer.string_offset(string) as f32;
        let corrected = self.quantizer.position_of(position) + snap;
        let frequency = self.tuning.frequency_at(string, corrected - offset);

        let target = PitchTarget {
            position: corrected,
            frequency,
            playback_rate: frequency / self.excitation_hz,
        };
        (snap, target)
    }

    /// Glide `voice` toward the pitch for `fret_offset + bend_semitones`.
    pub fn bend(
        &self,
        mode: &ScaleMode,
        voice: &mut Voice,
        fret_offset: f32,
        bend_semitones: f32,
        now: f64,
    ) -> PitchTarget {
        let target = self.target(
            mode,
            voice.position(),
            voice.static_snap(),
            fret_offset + bend_semitones,
        );

        let rate = voice.player_mut();
        rate.cancel_and_hold(now);
        rate.set_target_at(target.playback_rate, now, self.time_constant);

        voice.set_pitch(target.frequency, target.playback_rate);
        target
    }
}
