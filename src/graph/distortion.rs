use crate::{
    dsp::distortion::soft_clip_buffer,
    graph::node::{GraphNode, RenderCtx},
};

/// Soft-clip waveshaper for the shared bus.
pub struct DistortionNode {
    drive: f32,
}

impl DistortionNode {
    pub fn soft_clip(drive: f32) -> Self {
        Self {
            drive: drive.max(0.0),
        }
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }
}

impl GraphNode for DistortionNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        soft_clip_buffer(out, self.drive);
    }

    fn is_active(&self) -> bool {
        false
    }
}
