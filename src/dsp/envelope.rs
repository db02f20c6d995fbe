use crate::{
    config::EnvelopeConfig,
    dsp::automation::ParamTimeline,
    MIN_TIME,
};

/*
Scheduled Envelope
==================

A per-sample envelope advances its own level every sample. Here the envelope
never touches samples at all: it writes a gain curve onto an automation
timeline once at note-on and once more at note-off, and the audio thread
plays the curve back.

The Shape
---------

  Level
   peak ┐    ╱╲
        │   ╱  ╲________________
   sus  │  ╱                    ●╲   ← release starts from the level
        │ ╱                        ╲    actually in effect, not `sus`
    0.0 └╱───────────────────────────╲──→ audio clock
        │attack│decay│  sustaining  │release│tail│
                                            stop playback

At note-on three events go on the timeline:

    set-value  0      @ now
    ramp       peak   @ now + attack
    ramp       sus    @ now + attack + decay

Once the audio clock passes the decay end the voice is logically Sustaining;
nothing more is scheduled until note-off.

Release
-------

Note-off may arrive at any point, including mid-attack. We cancel everything
still pending, pin the gain at its current value and ramp from THERE to zero:

    cancel+hold      @ now
    ramp       0     @ now + release

Starting from the nominal sustain level instead would make a note released
during its attack jump upward, an audible click. Playback is stopped a short
tail after the ramp reaches zero so the voice is guaranteed silent before its
resources are torn down.

The State Machine
-----------------

    Attacking ──(clock ≥ decay end)──→ Sustaining
        │                                  │
        └──────────── release ─────────────┤
                                           ↓
                                       Releasing ──(voice retired)──→ Terminated

Releasing is entered exactly once. Nothing reaches Terminated without
passing through Releasing.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Attacking, // Ramping to peak, then down to sustain
    Sustaining, // Decay finished, holding until note-off
    Releasing, // Ramping from the captured level to zero
    Terminated, // Playback stopped, resources released
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Attack { sustain_at: f64 },
    Release { silent_at: f64 },
    Done,
}

#[derive(Debug, Clone)]
pub struct EnvelopeScheduler {
    attack_secs: f32,
    peak_level: f32,
    decay_secs: f32,
    sustain_level: f32,
    release_secs: f32,
    stop_tail_secs: f32,
    stage: Stage,
}

impl EnvelopeScheduler {
    /// Schedule the attack/decay curve on `gain` starting at `now`.
    pub fn start<P: ParamTimeline>(config: &EnvelopeConfig, gain: &mut P, now: f64) -> Self {
        let attack = config.attack_secs.max(MIN_TIME);
        let decay = config.decay_secs.max(MIN_TIME);
        let peak = config.peak_level.clamp(0.0, 1.0);
        let sustain = config.sustain_level.clamp(0.0, 1.0);

        let peak_at = now + f64::from(attack);
        let sustain_at = peak_at + f64::from(decay);

        gain.cancel_scheduled(now);
        gain.set_value_at(0.0, now);
        gain.linear_ramp_to(peak, peak_at);
        gain.linear_ramp_to(sustain, sustain_at);

        Self {
            attack_secs: attack,
            peak_level: peak,
            decay_secs: decay,
            sustain_level: sustain,
            release_secs: config.release_secs.max(0.0),
            stop_tail_secs: config.stop_tail_secs.max(0.0),
            stage: Stage::Attack { sustain_at },
        }
    }

    pub fn state(&self, now: f64) -> EnvelopeState {
        match self.stage {
            Stage::Attack { sustain_at } if now < sustain_at => EnvelopeState::Attacking,
            Stage::Attack { .. } => EnvelopeState::Sustaining,
            Stage::Release { .. } => EnvelopeState::Releasing,
            Stage::Done => EnvelopeState::Terminated,
        }
    }

    /// Begin the release from the gain in effect at `now`.
    ///
    /// Returns the time at which playback should stop, or `None` if the
    /// envelope is already releasing or terminated.
    pub fn release<P: ParamTimeline>(&mut self, gain: &mut P, now: f64) -> Option<f64> {
        self.release_over(gain, now, self.release_secs)
    }

    /// Release with a zero-length ramp, used when a voice is superseded.
    pub fn release_now<P: ParamTimeline>(&mut self, gain: &mut P, now: f64) -> Option<f64> {
        self.release_over(gain, now, 0.0)?;
        Some(now)
    }

    fn release_over<P: ParamTimeline>(&mut self, gain: &mut P, now: f64, secs: f32) -> Option<f64> {
        if !matches!(self.stage, Stage::Attack { .. }) {
            return None;
        }

        let silent_at = now + f64::from(secs);
        gain.cancel_and_hold(now);
        if secs > 0.0 {
            gain.linear_ramp_to(0.0, silent_at);
        } else {
            gain.set_value_at(0.0, now);
        }

        self.stage = Stage::Release { silent_at };
        Some(silent_at + f64::from(self.stop_tail_secs))
    }

    /// Final transition once playback has stopped. Only valid while releasing.
    pub fn terminate(&mut self) -> bool {
        if matches!(self.stage, Stage::Release { .. }) {
            self.stage = Stage::Done;
            true
        } else {
            false
        }
    }

    /// Time the release ramp reaches zero, once releasing.
    pub fn silent_at(&self) -> Option<f64> {
        match self.stage {
            Stage::Release { silent_at } => Some(silent_at),
            _ => None,
        }
    }

    pub fn attack_secs(&self) -> f32 {
        self.attack_secs
    }

    pub fn decay_secs(&self) -> f32 {
        self.decay_secs
    }

    pub fn peak_level(&self) -> f32 {
        self.peak_level
    }

    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }
}
