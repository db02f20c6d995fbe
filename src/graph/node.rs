/// Context passed to graph nodes during rendering
///
/// - sample_rate: device sample rate (e.g., 48000.0)
/// - time: audio-clock time of the first frame in the block, in seconds
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn at(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Audio-clock time of frame `index` within the block.
    #[inline]
    pub fn frame_time(&self, index: usize) -> f64 {
        self.time + index as f64 / f64::from(self.sample_rate)
    }
}

/// Core trait for audio processing graph nodes
///
/// Nodes render a block in place. Sources overwrite `out`, processors
/// transform whatever is already there.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Check if this node is still producing sound
    ///
    /// The bus retires a voice once its node reports inactive. Processors
    /// that only shape another node's signal return `false` so that activity
    /// is decided by the source alone.
    fn is_active(&self) -> bool {
        true
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_time_steps_by_sample_period() {
        let ctx = RenderCtx::at(1_000.0, 2.0);
        assert_eq!(ctx.frame_time(0), 2.0);
        assert!((ctx.frame_time(250) - 2.25).abs() < 1e-12);
    }
}
