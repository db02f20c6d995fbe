//! Cross-thread automation lanes.
//!
//! A lane is split in two: the control side holds a [`ParamHandle`], the
//! audio side a [`ParamLane`]. Every op goes into a mirror timeline on the
//! control side and down an rtrb ring to the audio side, so both evaluate the
//! same curve and the control side can ask for "the value now" without
//! waiting on the renderer.

use log::warn;
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    dsp::automation::{AutomationOp, AutomationParam, ParamTimeline},
    graph::node::RenderCtx,
    MAX_BLOCK_SIZE,
};

/// Control-side end of an automation lane.
pub struct ParamHandle {
    mirror: AutomationParam,
    tx: Producer<AutomationOp>,
}

/// Audio-side end of an automation lane.
pub struct ParamLane {
    param: AutomationParam,
    rx: Consumer<AutomationOp>,
    values: Vec<f32>,
}

/// Create a connected lane pair holding `initial` until the first event.
pub fn automation_lane(initial: f32, capacity: usize) -> (ParamLane, ParamHandle) {
    let (tx, rx) = RingBuffer::<AutomationOp>::new(capacity.max(1));

    let lane = ParamLane {
        param: AutomationParam::new(initial),
        rx,
        values: vec![initial; MAX_BLOCK_SIZE],
    };
    let handle = ParamHandle {
        mirror: AutomationParam::new(initial),
        tx,
    };

    (lane, handle)
}

impl ParamHandle {
    /// The control-side copy of the timeline.
    pub fn timeline(&self) -> &AutomationParam {
        &self.mirror
    }

    /// Drop mirrored events that can no longer affect the curve.
    pub fn prune(&mut self, now: f64) {
        self.mirror.prune(now);
    }
}

impl ParamTimeline for ParamHandle {
    fn apply(&mut self, op: AutomationOp) {
        // The mirror only records what the audio side will also see
        if self.tx.push(op).is_err() {
            warn!(target: "fretwork::engine", "automation queue full, dropped {:?}", op);
            return;
        }
        self.mirror.apply(op);
    }

    fn value_at(&self, time: f64) -> f32 {
        self.mirror.value_at(time)
    }
}

impl ParamLane {
    /// Apply every pending op, then sample the curve for this block.
    ///
    /// Returns one value per frame, `len` frames long.
    pub fn render(&mut self, len: usize, ctx: &RenderCtx) -> &[f32] {
        while let Ok(op) = self.rx.pop() {
            self.param.apply(op);
        }
        self.param.prune(ctx.time);

        let values = &mut self.values[..len];
        self.param.fill(values, ctx.time, ctx.sample_rate);
        values
    }

    pub fn value_at(&self, time: f64) -> f32 {
        self.param.value_at(time)
    }
}
