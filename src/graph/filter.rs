use crate::{
    dsp::filter::SVFilter,
    graph::node::{GraphNode, RenderCtx},
};

/// Graph wrapper around the band-pass filter, used as the effect side of
/// `.through()`.
pub struct FilterNode {
    filter: SVFilter,
}

impl FilterNode {
    pub fn bandpass(cutoff_hz: f32) -> Self {
        Self {
            filter: SVFilter::bandpass(cutoff_hz),
        }
    }

    pub fn with_resonance(self, resonance: f32) -> Self {
        Self {
            filter: self.filter.with_resonance(resonance),
        }
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.filter.render(out, ctx);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        // Stale integrator state from the previous strike would smear the onset
        self.filter.reset();
    }

    fn is_active(&self) -> bool {
        false
    }
}
