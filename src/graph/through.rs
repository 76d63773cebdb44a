use crate::graph::node::{GraphNode, RenderCtx};

/// Serial chain: render `source`, then process it in place with `effect`.
///
/// ```ignore
/// OscNode::noise().through(FilterNode::bandpass(2_500.0))
/// ```
pub struct Through<S, F> {
    source: S,
    effect: F,
}

impl<S, F> Through<S, F> {
    pub fn new(source: S, effect: F) -> Self {
        Self { source, effect }
    }
}

impl<S: GraphNode, F: GraphNode> GraphNode for Through<S, F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.effect.render_block(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source.note_on(ctx);
        self.effect.note_on(ctx);
    }

    fn is_active(&self) -> bool {
        self.source.is_active()
    }
}
