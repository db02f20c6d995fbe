use std::{collections::HashMap, sync::Arc};

use log::{debug, info, trace, warn};

use crate::{
    config::EngineConfig,
    dsp::envelope::EnvelopeState,
    error::{EngineError, EngineResult},
    graph::{
        analyser::ScopeReader,
        bus::{BusCommand, BusHandle, BusQueues, MixBus},
    },
    instrument::{
        scale::{ScaleMode, ScaleQuantizer},
        tuning::{FretPosition, StringTuning},
    },
    io::{
        clock::AudioClock,
        sample::{SampleCache, SampleLoader},
    },
    synth::{
        bend::{PitchBendEngine, PitchTarget},
        message::{InputEvent, MessageReceiver},
        registry::VoiceRegistry,
        voice::{Voice, VoiceId, VoiceKey, VoiceStart},
    },
};

/*
Voice Lifecycle
===============

The engine is the control side. It owns everything about which notes exist;
the bus owns only the audio nodes.

  create(a) ──→ registry[a] ──stop(a)──→ releasing[key] ──bus retires──→ dropped
                    │                          ↑
                    └── create(a) again ───────┘  (zero-length release + detach)

A stopped voice leaves the registry straight away, so its id is free for the
next note while the old one finishes its release tail. The bus reports back
when a node has left it; `reap` turns those reports into the final
Releasing → Terminated step and drops the voice's handles.

Automation is stamped at `event_time`, the audio clock plus a schedule-ahead
of about one device buffer. The bus picks up commands only between blocks, so
an event stamped at the bare clock would already be in the past when it lands.

Only `create` can block: the first note waits for the excitation clip to load.
Everything else schedules automation and returns.
*/

/// Point-in-time view of one live voice, for displays and logs.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSnapshot {
    pub id: VoiceId,
    pub key: VoiceKey,
    pub string: usize,
    pub fret: usize,
    pub frequency: f32,
    pub playback_rate: f32,
    pub gain: f32,
    pub state: EnvelopeState,
}

pub struct FretEngine {
    config: EngineConfig,
    registry: VoiceRegistry,
    releasing: HashMap<VoiceKey, Voice>,
    scale_mode: ScaleMode,
    pitch: PitchBendEngine,
    samples: Arc<SampleCache>,
    bus: BusHandle,
    clock: AudioClock,
    next_key: u64,
}

impl FretEngine {
    /// Build the engine and the audio side it drives.
    ///
    /// The returned [`MixBus`] goes to the audio callback, the
    /// [`ScopeReader`] to whatever draws the waveform.
    pub fn new<L: SampleLoader + 'static>(
        config: EngineConfig,
        sample_rate: f32,
        loader: L,
    ) -> EngineResult<(Self, MixBus, ScopeReader)> {
        Self::with_cache(config, sample_rate, Arc::new(SampleCache::new(loader)))
    }

    /// Like [`FretEngine::new`], sharing an existing sample cache.
    pub fn with_cache(
        config: EngineConfig,
        sample_rate: f32,
        samples: Arc<SampleCache>,
    ) -> EngineResult<(Self, MixBus, ScopeReader)> {
        let tuning = StringTuning::new(config.open_strings)?;
        let quantizer = ScaleQuantizer::new(&tuning, config.reference_hz, &config.scale_degrees);
        let pitch = PitchBendEngine::new(
            tuning,
            quantizer,
            config.excitation_hz,
            config.bend_time_constant,
        );

        let clock = AudioClock::new(sample_rate);
        let queues = BusQueues {
            commands: config.command_queue,
            scope: config.scope_queue,
            scope_window: SCOPE_WINDOW,
        };
        let (bus, handle, scope) = MixBus::new(&config.bus, queues, clock.clone());

        info!(
            target: "fretwork::engine",
            "engine ready at {} Hz, {} frets, scale degrees {:?}",
            sample_rate, config.fret_count, config.scale_degrees
        );

        let engine = Self {
            config,
            registry: VoiceRegistry::new(),
            releasing: HashMap::new(),
            scale_mode: ScaleMode::default(),
            pitch,
            samples,
            bus: handle,
            clock,
            next_key: 0,
        };

        Ok((engine, bus, scope))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    /// Current audio time in seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Audio time the next note-on, bend or note-off takes effect: the clock
    /// plus the configured schedule-ahead, so the audio side receives the
    /// event before it is due.
    pub fn event_time(&self) -> f64 {
        self.clock.now() + f64::from(self.config.schedule_ahead_secs.max(0.0))
    }

    /// A handle to the scale-mode flag; clones toggle the same flag.
    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode.clone()
    }

    pub fn quantizer(&self) -> &ScaleQuantizer {
        self.pitch.quantizer()
    }

    pub fn samples(&self) -> &Arc<SampleCache> {
        &self.samples
    }

    /// Validate a fretboard position against this engine's fret count.
    pub fn position(&self, string: usize, fret: usize) -> EngineResult<FretPosition> {
        FretPosition::new(string, fret, self.config.fret_count)
    }

    /// Load the excitation clip now instead of on the first note.
    pub fn preload(&self) -> EngineResult {
        self.samples.get_or_load()?;
        Ok(())
    }

    /// Start a note at `position` under `id`, replacing any live voice with
    /// that id.
    ///
    /// Blocks while the excitation clip is loading. On failure no voice is
    /// created and an existing voice under `id` keeps playing.
    pub fn create(&mut self, position: FretPosition, id: impl Into<VoiceId>) -> EngineResult<VoiceKey> {
        let id = id.into();
        let sample = self.samples.get_or_load()?;

        let needed = if self.registry.contains(&id) { 2 } else { 1 };
        if self.bus.commands.slots() < needed {
            warn!(target: "fretwork::engine", "bus queue full, dropping note {}", id);
            return Err(EngineError::BusFull);
        }

        let now = self.event_time();
        if let Some(previous) = self.registry.remove(&id) {
            self.supersede(previous, now);
        }

        let (snap, target) = self.pitch.initial(&self.scale_mode, position);
        let key = VoiceKey::new(self.next_key);
        self.next_key += 1;

        let start = VoiceStart {
            position,
            static_snap: snap,
            frequency: target.frequency,
            playback_rate: target.playback_rate,
        };
        let (voice, node) = Voice::spawn(id.clone(), key, start, sample, &self.config, now);

        self.send(BusCommand::Attach { key, node })?;
        self.registry.insert(voice);

        debug!(
            target: "fretwork::engine",
            "note on {} {} string {} fret {} at {:.2} Hz (snap {:+})",
            id, key, position.string(), position.fret(), target.frequency, snap
        );
        Ok(key)
    }

    // The old voice still passes through Releasing, with no ramp, and its
    // node is detached before the replacement is attached.
    fn supersede(&mut self, mut previous: Voice, now: f64) {
        previous.release_now(now);
        let key = previous.key();
        debug!(target: "fretwork::engine", "superseding {} {}", previous.id(), key);

        if self.send(BusCommand::Detach { key }).is_err() {
            // Playback still stops at the scheduled time
            warn!(target: "fretwork::engine", "detach of {} not queued", key);
        }
        self.park(previous);
    }

    /// Re-pitch a live voice to `fret_offset + bend_semitones` from its
    /// note-on position. Unknown ids are ignored.
    pub fn update_pitch(
        &mut self,
        id: &VoiceId,
        fret_offset: f32,
        bend_semitones: f32,
    ) -> Option<PitchTarget> {
        if !(fret_offset.is_finite() && bend_semitones.is_finite()) {
            warn!(
                target: "fretwork::engine",
                "ignoring non-finite bend {} / {} for {}",
                fret_offset, bend_semitones, id
            );
            return None;
        }

        let now = self.event_time();
        let Some(voice) = self.registry.get_mut(id) else {
            trace!(target: "fretwork::engine", "pitch update for unknown voice {}", id);
            return None;
        };

        let target = self
            .pitch
            .bend(&self.scale_mode, voice, fret_offset, bend_semitones, now);
        trace!(
            target: "fretwork::engine",
            "bend {} to {:.2} Hz (rate {:.3})",
            id, target.frequency, target.playback_rate
        );
        Some(target)
    }

    /// Release a live voice. Unknown ids, including ones already stopped,
    /// are ignored. Returns whether a voice was released.
    pub fn stop(&mut self, id: &VoiceId) -> bool {
        let Some(mut voice) = self.registry.remove(id) else {
            trace!(target: "fretwork::engine", "stop for unknown voice {}", id);
            return false;
        };

        let now = self.event_time();
        voice.release(now);
        debug!(
            target: "fretwork::engine",
            "note off {} {}, stops at {:.3}s",
            id, voice.key(), voice.stop_at().unwrap_or(now)
        );
        self.park(voice);
        true
    }

    // Hold a released voice until the bus retires its node
    fn park(&mut self, mut voice: Voice) {
        if voice.is_detached() {
            voice.terminate();
            trace!(target: "fretwork::engine", "voice {} terminated", voice.key());
            return;
        }
        self.releasing.insert(voice.key(), voice);
    }

    fn send(&mut self, command: BusCommand) -> EngineResult {
        self.bus.commands.push(command).map_err(|_| EngineError::BusFull)
    }

    /// Collect nodes the bus has finished with and terminate their voices.
    ///
    /// Returns the number of voices terminated. Call regularly from the
    /// control thread; it never blocks.
    pub fn reap(&mut self) -> usize {
        let mut terminated = 0;

        while let Ok(retired) = self.bus.retired.pop() {
            if let Some(mut voice) = self.releasing.remove(&retired.key) {
                voice.terminate();
                terminated += 1;
                trace!(target: "fretwork::engine", "voice {} terminated", retired.key);
            } else if let Some(voice) = self
                .registry
                .iter_mut()
                .find(|voice| voice.key() == retired.key)
            {
                // Held past the end of the clip; terminates once stopped
                voice.mark_detached();
                debug!(target: "fretwork::engine", "voice {} ran out of excitation", voice.id());
            }
            drop(retired.node);
        }

        let now = self.clock.now();
        for voice in self.registry.iter_mut() {
            voice.prune(now);
        }

        terminated
    }

    /// Apply one input event.
    pub fn handle_event(&mut self, event: InputEvent) -> EngineResult {
        match event {
            InputEvent::NoteOn { string, fret, id } => {
                let position = self.position(string, fret)?;
                self.create(position, id)?;
            }
            InputEvent::PitchUpdate {
                id,
                fret_offset,
                bend_semitones,
            } => {
                if !(fret_offset.is_finite() && bend_semitones.is_finite()) {
                    return Err(EngineError::InvalidBend {
                        fret_offset,
                        bend_semitones,
                    });
                }
                self.update_pitch(&id, fret_offset, bend_semitones);
            }
            InputEvent::NoteOff { id } => {
                self.stop(&id);
            }
        }
        Ok(())
    }

    /// Apply every pending event from `rx`, logging the ones that fail.
    ///
    /// Returns the number of events applied successfully.
    pub fn drain_events<R: MessageReceiver>(&mut self, rx: &mut R) -> usize {
        let mut applied = 0;
        while let Some(event) = rx.pop() {
            match self.handle_event(event) {
                Ok(()) => applied += 1,
                Err(e) => warn!(target: "fretwork::engine", "input event rejected: {}", e),
            }
        }
        applied
    }

    pub fn voice(&self, id: &VoiceId) -> Option<&Voice> {
        self.registry.get(id)
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.registry.iter()
    }

    pub fn voice_count(&self) -> usize {
        self.registry.len()
    }

    /// Voices stopped but not yet retired by the bus.
    pub fn releasing(&self) -> impl Iterator<Item = &Voice> {
        self.releasing.values()
    }

    pub fn releasing_count(&self) -> usize {
        self.releasing.len()
    }

    /// Snapshot of every live voice, ordered by key (oldest first).
    pub fn snapshot(&self) -> Vec<VoiceSnapshot> {
        let now = self.clock.now();
        let mut voices: Vec<VoiceSnapshot> = self
            .registry
            .iter()
            .map(|voice| VoiceSnapshot {
                id: voice.id().clone(),
                key: voice.key(),
                string: voice.position().string(),
                fret: voice.position().fret(),
                frequency: voice.base_freq(),
                playback_rate: voice.playback_rate(),
                gain: voice.gain_at(now),
                state: voice.envelope_state(now),
            })
            .collect();
        voices.sort_by_key(|v| v.key);
        voices
    }
}

const SCOPE_WINDOW: usize = 1024;
