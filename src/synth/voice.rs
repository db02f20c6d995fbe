use std::{fmt, sync::Arc};

use crate::{
    config::EngineConfig,
    dsp::{
        automation::ParamTimeline,
        envelope::{EnvelopeScheduler, EnvelopeState},
    },
    graph::{
        extensions::NodeExt,
        filter::tone_chain,
        gain::GainNode,
        node::GraphNode,
        param::ParamHandle,
        player::{ExcitationPlayer, PlayerHandle},
    },
    instrument::tuning::FretPosition,
    io::sample::ExcitationSample,
};

/// Identifier the input layer assigns to a note (a pointer id, a key name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VoiceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for VoiceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for VoiceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Engine-internal name of one voice's audio node.
///
/// Unlike [`VoiceId`] it is never reused, so a voice that is still releasing
/// and its successor under the same id cannot be confused on the audio side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceKey(u64);

impl VoiceKey {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a new voice starts: physical position and initial pitch.
#[derive(Debug, Clone, Copy)]
pub struct VoiceStart {
    pub position: FretPosition,
    /// Scale correction applied at note-on, zero when scale mode was off
    pub static_snap: f32,
    pub frequency: f32,
    pub playback_rate: f32,
}

/// Control-side record of one sounding note.
///
/// The audio work happens in the node returned by [`Voice::spawn`]; the voice
/// keeps the handles that schedule on that node's gain and rate lanes.
pub struct Voice {
    id: VoiceId,
    key: VoiceKey,
    position: FretPosition,
    static_snap: f32,
    base_freq: f32,
    playback_rate: f32,
    envelope: EnvelopeScheduler,
    gain: ParamHandle,
    player: PlayerHandle,
    stop_at: Option<f64>,
    // The bus has already dropped this voice's node
    detached: bool,
}

impl Voice {
    /// Build a voice and its private audio chain, starting the attack at `now`.
    /// The clip stays at its first frame until then.
    ///
    ///   player ─→ high pass ─→ low pass ─→ (×) ─→ bus
    ///                                       ↑
    ///                                   gain lane
    pub fn spawn(
        id: VoiceId,
        key: VoiceKey,
        start: VoiceStart,
        sample: Arc<ExcitationSample>,
        config: &EngineConfig,
        now: f64,
    ) -> (Self, Box<dyn GraphNode>) {
        let (mut player, player_handle) =
            ExcitationPlayer::new(sample, start.playback_rate, config.voice_queue);
        player.set_start(now);
        let (gain, mut gain_handle) = GainNode::new(0.0, config.voice_queue);
        let envelope = EnvelopeScheduler::start(&config.envelope, &mut gain_handle, now);

        let node = tone_chain(player, &config.tone).amplify(gain);

        let voice = Self {
            id,
            key,
            position: start.position,
            static_snap: start.static_snap,
            base_freq: start.frequency,
            playback_rate: start.playback_rate,
            envelope,
            gain: gain_handle,
            player: player_handle,
            stop_at: None,
            detached: false,
        };

        (voice, Box::new(node))
    }

    pub fn id(&self) -> &VoiceId {
        &self.id
    }

    pub fn key(&self) -> VoiceKey {
        self.key
    }

    pub fn position(&self) -> FretPosition {
        self.position
    }

    pub fn static_snap(&self) -> f32 {
        self.static_snap
    }

    pub fn base_freq(&self) -> f32 {
        self.base_freq
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    pub fn envelope_state(&self, now: f64) -> EnvelopeState {
        self.envelope.state(now)
    }

    /// Gain the envelope has in effect at `now`.
    pub fn gain_at(&self, now: f64) -> f32 {
        self.gain.value_at(now)
    }

    /// Playback rate in effect at `now`, mid-glide included.
    pub fn rate_at(&self, now: f64) -> f32 {
        self.player.value_at(now)
    }

    /// When playback is scheduled to stop, once releasing.
    pub fn stop_at(&self) -> Option<f64> {
        self.stop_at
    }

    pub fn is_released(&self) -> bool {
        self.stop_at.is_some()
    }

    /// Whether the node has left the bus, e.g. by playing past the end of
    /// the clip while the note was still held.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub(crate) fn mark_detached(&mut self) {
        self.detached = true;
    }

    pub(crate) fn player_mut(&mut self) -> &mut PlayerHandle {
        &mut self.player
    }

    pub(crate) fn set_pitch(&mut self, frequency: f32, playback_rate: f32) {
        self.base_freq = frequency;
        self.playback_rate = playback_rate;
    }

    /// Start the release from the current gain. Returns `false` if the voice
    /// was already releasing.
    pub fn release(&mut self, now: f64) -> bool {
        let stop_at = self.envelope.release(&mut self.gain, now);
        self.schedule_stop(stop_at)
    }

    /// Zero-length release for a voice being replaced under the same id.
    pub fn release_now(&mut self, now: f64) -> bool {
        let stop_at = self.envelope.release_now(&mut self.gain, now);
        self.schedule_stop(stop_at)
    }

    fn schedule_stop(&mut self, stop_at: Option<f64>) -> bool {
        match stop_at {
            Some(at) => {
                self.player.stop_at(at);
                self.stop_at = Some(at);
                true
            }
            None => false,
        }
    }

    /// Mark the voice finished once its node has left the bus.
    pub fn terminate(&mut self) -> bool {
        self.envelope.terminate()
    }

    /// Drop mirrored automation that is already in the past.
    pub fn prune(&mut self, now: f64) {
        self.gain.prune(now);
        self.player.rate_mut().prune(now);
    }
}

impl fmt::Debug for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("position", &self.position)
            .field("base_freq", &self.base_freq)
            .field("playback_rate", &self.playback_rate)
            .field("stop_at", &self.stop_at)
            .field("detached", &self.detached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::RenderCtx;

    fn sample() -> Arc<ExcitationSample> {
        let samples = (0..4_800).map(|i| ((i as f32) * 0.05).sin()).collect();
        Arc::new(ExcitationSample::new(samples, 48_000, 82.41).unwrap())
    }

    fn start() -> VoiceStart {
        VoiceStart {
            position: FretPosition::new(0, 5, 15).unwrap(),
            static_snap: 0.0,
            frequency: 110.0,
            playback_rate: 110.0 / 82.41,
        }
    }

    #[test]
    fn ids_from_strings_and_numbers() {
        assert_eq!(VoiceId::from("pointer-1"), VoiceId::from(String::from("pointer-1")));
        assert_eq!(VoiceId::from(7u64).as_str(), "7");
        assert_eq!(VoiceKey::new(3).to_string(), "#3");
    }

    #[test]
    fn spawn_starts_attacking_from_silence() {
        let config = EngineConfig::default();
        let (voice, _node) =
            Voice::spawn("a".into(), VoiceKey::new(0), start(), sample(), &config, 0.0);

        assert_eq!(voice.envelope_state(0.0), EnvelopeState::Attacking);
        assert!(voice.gain_at(0.0).abs() < 1e-6);
        assert!((voice.rate_at(0.0) - 110.0 / 82.41).abs() < 1e-6);
    }

    #[test]
    fn node_renders_enveloped_audio() {
        let config = EngineConfig::default();
        let (_voice, mut node) =
            Voice::spawn("a".into(), VoiceKey::new(0), start(), sample(), &config, 0.0);

        let mut out = vec![0.0f32; 1_024];
        node.render_block(&mut out, &RenderCtx::at(48_000.0, 0.0));

        assert!(out[0].abs() < 1e-6);
        assert!(out.iter().any(|s| s.abs() > 1e-3));
        assert!(node.is_active());
    }

    #[test]
    fn release_only_once() {
        let config = EngineConfig::default();
        let (mut voice, _node) =
            Voice::spawn("a".into(), VoiceKey::new(0), start(), sample(), &config, 0.0);

        assert!(voice.release(0.5));
        let stop_at = voice.stop_at().unwrap();
        assert!(!voice.release(0.6));
        assert!(!voice.release_now(0.6));
        assert_eq!(voice.stop_at(), Some(stop_at));
        assert_eq!(voice.envelope_state(0.6), EnvelopeState::Releasing);
    }
}
