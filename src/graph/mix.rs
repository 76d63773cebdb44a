use crate::{
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/*
Parallel Signal Mixing
======================

Mix layers two sources with a linear crossfade:

    output = A * (1 - balance) + B * balance

  balance = 0.0 -> only A
  balance = 0.3 -> mostly A, a little B (typical for an overtone)
  balance = 1.0 -> only B

Click styles are mostly stacks of partials, built by chaining mixes:

  partial(1.0).mix(partial(2.76), 0.4).mix(partial(5.4), 0.25)

Each later `.mix()` attenuates everything before it by (1 - balance), so
later partials should use smaller balances. Absolute level does not matter
much: rendered clicks are peak-normalized afterwards.

Both sources receive note_on. Gate each partial with its own envelope before
mixing when partials should ring out at different rates.
*/

pub struct Mix<A, B> {
    pub source_a: A,
    pub source_b: B,
    pub balance: f32, // 0.0 = all A, 1.0 = all B
    temp_buffer: Vec<f32>,
}

impl<A, B> Mix<A, B> {
    pub fn new(source_a: A, source_b: B, balance: f32) -> Self {
        Mix {
            source_a,
            source_b,
            balance: balance.clamp(0.0, 1.0),
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<A: GraphNode, B: GraphNode> GraphNode for Mix<A, B> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source_a.render_block(out, ctx);

        let frames = &mut self.temp_buffer[..out.len()];
        frames.fill(0.0);
        self.source_b.render_block(frames, ctx);

        let weight_a = 1.0 - self.balance;
        let weight_b = self.balance;
        for (o, b) in out.iter_mut().zip(frames.iter()) {
            *o = (*o * weight_a) + (*b * weight_b);
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source_a.note_on(ctx);
        self.source_b.note_on(ctx);
    }

    fn is_active(&self) -> bool {
        self.source_a.is_active() || self.source_b.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{envelope::EnvNode, extensions::NodeExt, oscillator::OscNode};

    #[test]
    fn balance_extremes_select_one_source() {
        let ctx = RenderCtx::from_freq(48_000.0, 1_000.0, 1.0);
        let mut only_a = OscNode::sine().mix(OscNode::noise(), 0.0);
        let mut reference = OscNode::sine();

        let mut a = vec![0.0f32; 128];
        let mut b = vec![0.0f32; 128];
        only_a.render_block(&mut a, &ctx);
        reference.render_block(&mut b, &ctx);
        assert_eq!(a, b);
    }

    #[test]
    fn active_while_either_side_rings() {
        let ctx = RenderCtx::from_freq(48_000.0, 1_000.0, 1.0);
        let short = OscNode::sine().amplify(EnvNode::percussive(0.001, 0.005));
        let long = OscNode::sine().amplify(EnvNode::percussive(0.001, 0.05));
        let mut mixed = short.mix(long, 0.5);
        mixed.note_on(&ctx);

        // ~10ms in: the short partial is done, the long one still rings
        let mut buffer = vec![0.0f32; 480];
        mixed.render_block(&mut buffer, &ctx);
        assert!(mixed.is_active());
        assert!(!mixed.source_a.is_active());
    }
}
