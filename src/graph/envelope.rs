use crate::{
    dsp::envelope::Envelope,
    graph::node::{GraphNode, RenderCtx},
};

/// Graph wrapper around the percussive envelope.
///
/// Used as the modulator side of `.amplify()`:
///
/// ```ignore
/// OscNode::sine().amplify(EnvNode::percussive(0.001, 0.03))
/// ```
pub struct EnvNode {
    env: Envelope,
}

impl EnvNode {
    /// Linear attack, exponential decay to -60 dB after `decay` seconds
    pub fn percussive(attack: f32, decay: f32) -> Self {
        Self {
            env: Envelope::percussive(attack, decay),
        }
    }

    pub fn with_peak(self, peak: f32) -> Self {
        Self {
            env: self.env.with_peak(peak),
        }
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        self.env.render(out);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.env.note_on(ctx);
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}
