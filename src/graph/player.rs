use std::sync::Arc;

use log::warn;
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    dsp::automation::{AutomationOp, ParamTimeline},
    graph::{
        node::{GraphNode, RenderCtx},
        param::{automation_lane, ParamHandle, ParamLane},
    },
    io::sample::ExcitationSample,
};

/*
Excitation Playback
===================

Every note is the same recorded pluck played faster or slower:

    playback rate = target frequency / recorded fundamental

  rate 1.0   → the clip as recorded (low E)
  rate 2.0   → one octave up, clip finishes in half the time
  rate 0.5   → one octave down

The read head waits at frame 0 until the voice's start time (a note is
scheduled slightly ahead of the clock, so it is attached before it is due),
then advances by
`rate × clip_rate / device_rate` frames per output frame, so a clip recorded
at 44.1 kHz still plays at the right pitch on a 48 kHz device. The rate is an
automation lane: pitch bends glide it with exponential set-target events.

The player goes inactive, and with it the whole voice, when either:
  - the read head runs off the end of the usable window, or
  - the audio clock reaches the scheduled stop time.
*/

enum PlayerCommand {
    StopAt(f64),
}

const PLAYER_QUEUE_SIZE: usize = 4;

pub struct ExcitationPlayer {
    sample: Arc<ExcitationSample>,
    position: f64,
    rate: ParamLane,
    start_at: f64,
    stop_at: f64,
    finished: bool,
    rx: Consumer<PlayerCommand>,
}

/// Control-side handle to a player: its rate lane and its stop time.
pub struct PlayerHandle {
    rate: ParamHandle,
    tx: Producer<PlayerCommand>,
}

impl ExcitationPlayer {
    pub fn new(
        sample: Arc<ExcitationSample>,
        playback_rate: f32,
        queue_size: usize,
    ) -> (Self, PlayerHandle) {
        let (rate, rate_handle) = automation_lane(playback_rate, queue_size);
        let (tx, rx) = RingBuffer::<PlayerCommand>::new(PLAYER_QUEUE_SIZE);

        let node = Self {
            sample,
            position: 0.0,
            rate,
            start_at: 0.0,
            stop_at: f64::INFINITY,
            finished: false,
            rx,
        };
        let handle = PlayerHandle {
            rate: rate_handle,
            tx,
        };

        (node, handle)
    }

    /// Hold the read head at the start of the clip until the clock reaches `at`.
    pub fn set_start(&mut self, at: f64) {
        self.start_at = at;
    }

    /// Read head, in clip frames.
    pub fn position(&self) -> f64 {
        self.position
    }
}

impl GraphNode for ExcitationPlayer {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        while let Ok(command) = self.rx.pop() {
            match command {
                PlayerCommand::StopAt(at) => self.stop_at = self.stop_at.min(at),
            }
        }

        if self.finished {
            out.fill(0.0);
            return;
        }

        let step = f64::from(self.sample.sample_rate()) / f64::from(ctx.sample_rate);
        let rates = self.rate.render(out.len(), ctx);

        for (i, (sample, &rate)) in out.iter_mut().zip(rates.iter()).enumerate() {
            if self.finished || ctx.frame_time(i) >= self.stop_at {
                self.finished = true;
                *sample = 0.0;
                continue;
            }
            if ctx.frame_time(i) < self.start_at {
                *sample = 0.0;
                continue;
            }

            match self.sample.read(self.position) {
                Some(value) => {
                    *sample = value;
                    self.position += f64::from(rate.max(0.0)) * step;
                }
                None => {
                    self.finished = true;
                    *sample = 0.0;
                }
            }
        }
    }

    fn is_active(&self) -> bool {
        !self.finished
    }
}

impl PlayerHandle {
    /// Stop playback once the audio clock reaches `at`. An earlier stop
    /// time always wins.
    pub fn stop_at(&mut self, at: f64) {
        if self.tx.push(PlayerCommand::StopAt(at)).is_err() {
            warn!(target: "fretwork::engine", "player queue full, stop at {:.3}s dropped", at);
        }
    }

    pub fn rate(&self) -> &ParamHandle {
        &self.rate
    }

    pub fn rate_mut(&mut self) -> &mut ParamHandle {
        &mut self.rate
    }
}

impl ParamTimeline for PlayerHandle {
    fn apply(&mut self, op: AutomationOp) {
        self.rate.apply(op);
    }

    fn value_at(&self, time: f64) -> f32 {
        self.rate.value_at(time)
    }
}
