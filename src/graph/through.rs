use crate::graph::node::{GraphNode, RenderCtx};

/*
Serial Signal Chain (Through)
=============================

Through connects two nodes in series: the source renders into the block and
the processor then reshapes that same block in place.

  Source renders:     [0.5, 0.8, -0.3, 0.9, ...]
  Processor reshapes: [0.4, 0.6, -0.2, 0.7, ...]

A voice's tone chain is two Throughs deep:

  [ExcitationPlayer] ──→ [high pass] ──→ [low pass] ──→ out

and the bus applies its waveshaper the same way.

Through vs Amplify:
-------------------
  Through: [Source] ──→ [Processor] ──→ output

  Amplify: [Signal] ──┬──→ (×) ──→ output
           [Gain]   ──┘

A chain is active while either side is. Processors report inactive, so in
practice the source decides when a voice is finished.
*/

pub struct Through<S, F> {
    source: S,
    processor: F,
}

impl<S, F> Through<S, F> {
    pub fn new(source: S, processor: F) -> Self {
        Self { source, processor }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn processor(&self) -> &F {
        &self.processor
    }
}

impl<S: GraphNode, F: GraphNode> GraphNode for Through<S, F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.processor.render_block(out, ctx);
    }

    fn is_active(&self) -> bool {
        self.source.is_active() || self.processor.is_active()
    }
}
