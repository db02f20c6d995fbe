use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    config::BusConfig,
    graph::{
        analyser::{AnalysisTap, ScopeReader},
        distortion::DistortionNode,
        node::{GraphNode, RenderCtx},
    },
    io::clock::AudioClock,
    synth::voice::VoiceKey,
    MAX_BLOCK_SIZE,
};

/*
The Shared Bus
==============

Every voice renders into one pipeline that exists for the whole process:

  voice #1 ─┐
  voice #2 ─┼─→ (+) ─→ master gain ─→ soft clip ─→ analysis tap ─→ device
  voice #n ─┘                                          ↑
                                         external input (tap only)

The control side never touches the bus directly. It sends commands down an
rtrb ring; the bus applies them at the start of the next block:

  Attach { key, node }   start rendering a voice's chain
  Detach { key }         stop rendering it immediately

A voice leaves the bus when it is detached or when its node goes inactive
(its player reached the scheduled stop time or ran out of clip). The node is
then handed back over a second ring so it is dropped on the control side,
not in the audio callback:

  engine ──BusCommand──→ MixBus ──RetiredVoice──→ engine

After the block is rendered the bus advances the shared audio clock.
*/

pub enum BusCommand {
    Attach {
        key: VoiceKey,
        node: Box<dyn GraphNode>,
    },
    Detach {
        key: VoiceKey,
    },
}

/// A voice node that has left the bus, returned for teardown.
pub struct RetiredVoice {
    pub key: VoiceKey,
    pub node: Box<dyn GraphNode>,
}

struct BusVoice {
    key: VoiceKey,
    node: Box<dyn GraphNode>,
    retired: bool,
}

/// Control-side ends of the bus rings.
pub struct BusHandle {
    pub commands: Producer<BusCommand>,
    pub retired: Consumer<RetiredVoice>,
}

pub struct MixBus {
    commands: Consumer<BusCommand>,
    retired: Producer<RetiredVoice>,
    voices: Vec<BusVoice>,
    voice_buffer: Vec<f32>,
    master_gain: f32,
    shaper: DistortionNode,
    tap: AnalysisTap,
    clock: AudioClock,
}

/// Sizing for the bus rings.
#[derive(Debug, Clone, Copy)]
pub struct BusQueues {
    pub commands: usize,
    pub scope: usize,
    pub scope_window: usize,
}

impl MixBus {
    pub fn new(
        config: &BusConfig,
        queues: BusQueues,
        clock: AudioClock,
    ) -> (Self, BusHandle, ScopeReader) {
        let capacity = queues.commands.max(1);
        let (command_tx, command_rx) = RingBuffer::<BusCommand>::new(capacity);
        let (retired_tx, retired_rx) = RingBuffer::<RetiredVoice>::new(capacity);
        let (tap, scope) = AnalysisTap::new(queues.scope, queues.scope_window);

        let bus = Self {
            commands: command_rx,
            retired: retired_tx,
            voices: Vec::with_capacity(capacity),
            voice_buffer: vec![0.0; MAX_BLOCK_SIZE],
            master_gain: config.master_gain,
            shaper: DistortionNode::soft_clip(config.drive),
            tap,
            clock,
        };
        let handle = BusHandle {
            commands: command_tx,
            retired: retired_rx,
        };

        (bus, handle, scope)
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    /// Voices currently rendering.
    pub fn voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.retired).count()
    }

    /// Render `out` (mono) and advance the clock by its length.
    ///
    /// `external` is summed into the analysis tap only.
    pub fn render_block(&mut self, out: &mut [f32], external: Option<&[f32]>) {
        let mut offset = 0;
        while offset < out.len() {
            let end = (offset + MAX_BLOCK_SIZE).min(out.len());
            let ext = external.map(|ext| &ext[offset.min(ext.len())..end.min(ext.len())]);
            self.render_chunk(&mut out[offset..end], ext);
            offset = end;
        }
    }

    fn render_chunk(&mut self, out: &mut [f32], external: Option<&[f32]>) {
        let ctx = RenderCtx::at(self.clock.sample_rate(), self.clock.now());

        self.apply_commands();

        out.fill(0.0);
        let scratch = &mut self.voice_buffer[..out.len()];
        for voice in self.voices.iter_mut().filter(|v| !v.retired) {
            scratch.fill(0.0);
            voice.node.render_block(scratch, &ctx);
            for (o, s) in out.iter_mut().zip(scratch.iter()) {
                *o += *s;
            }
            if !voice.node.is_active() {
                voice.retired = true;
            }
        }
        self.flush_retired();

        for sample in out.iter_mut() {
            *sample *= self.master_gain;
        }
        self.shaper.render_block(out, &ctx);
        self.tap.observe(out, external);

        self.clock.advance(out.len());
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                BusCommand::Attach { key, node } => self.voices.push(BusVoice {
                    key,
                    node,
                    retired: false,
                }),
                BusCommand::Detach { key } => {
                    for voice in self.voices.iter_mut().filter(|v| v.key == key) {
                        voice.retired = true;
                    }
                }
            }
        }
    }

    // Hand retired nodes back; anything that does not fit waits for the next block
    fn flush_retired(&mut self) {
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].retired && self.retired.slots() > 0 {
                let voice = self.voices.swap_remove(i);
                let _ = self.retired.push(RetiredVoice {
                    key: voice.key,
                    node: voice.node,
                });
            } else {
                i += 1;
            }
        }
    }
}
