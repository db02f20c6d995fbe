use crate::graph::{
    node::{GraphNode, RenderCtx},
    param::{automation_lane, ParamHandle, ParamLane},
};

/// Renders a gain automation curve as a control signal.
///
/// Used as the modulator of an [`Amplify`](crate::graph::amplify::Amplify):
/// the envelope writes onto the returned [`ParamHandle`] and the node plays
/// the curve back one value per frame.
pub struct GainNode {
    lane: ParamLane,
}

impl GainNode {
    pub fn new(initial: f32, queue_size: usize) -> (Self, ParamHandle) {
        let (lane, handle) = automation_lane(initial, queue_size);
        (Self { lane }, handle)
    }
}

impl GraphNode for GainNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let values = self.lane.render(out.len(), ctx);
        out.copy_from_slice(values);
    }

    fn is_active(&self) -> bool {
        false
    }
}
