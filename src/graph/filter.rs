use crate::{
    config::ToneConfig,
    dsp::filter::{FilterType, SVFilter},
    graph::{
        extensions::NodeExt,
        node::{GraphNode, RenderCtx},
        through::Through,
    },
};

pub struct FilterNode {
    filter: SVFilter,
}

impl FilterNode {
    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        Self {
            filter: SVFilter::new(filter_type, cutoff_hz),
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz)
    }

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.filter.set_resonance(resonance);
        self
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter.filter_type()
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.filter.render(out, ctx);
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// Chain `source` through the voice tone stage: high pass, then low pass.
pub fn tone_chain<S: GraphNode>(
    source: S,
    tone: &ToneConfig,
) -> Through<Through<S, FilterNode>, FilterNode> {
    source
        .through(FilterNode::highpass(tone.highpass_hz).with_resonance(tone.resonance))
        .through(FilterNode::lowpass(tone.lowpass_hz).with_resonance(tone.resonance))
}
