use crate::dsp::oscillator::OscillatorBlock;
use crate::graph::node::{GraphNode, RenderCtx};

/*
Click Oscillators
=================

Every click style is built from two raw sources:

Sine: a single partial. Layer several at chosen ratios to build a timbre.
  - Harmonic ratios (1, 2, 3, ...) fuse into one pitched "beep"
  - Inharmonic ratios (1, 2.76, 5.4, 8.93) sound metallic, like a bell

Noise: every frequency at once, no pitch. Band-limit it with a filter to get
the knock of a wood block or the tick of a mechanical metronome.

Partials are expressed as a RATIO of the context frequency, so the same graph
renders both the regular click and a higher-pitched accent just by changing
`RenderCtx::frequency`:

  // 1x and 2.76x of whatever base the click is struck at
  OscNode::sine().mix(OscNode::sine().with_ratio(2.76), 0.4)

`with_frequency` pins a partial to an absolute pitch instead, for components
that should not follow the accent (e.g. a resonant body mode).
*/

pub struct OscNode {
    osc: OscillatorBlock,
    /// Fixed frequency (Hz). If Some, ignores ctx.frequency.
    fixed_frequency: Option<f32>,
    /// Multiplier applied to ctx.frequency when not fixed
    ratio: f32,
}

impl OscNode {
    fn new(osc: OscillatorBlock) -> Self {
        Self {
            osc,
            fixed_frequency: None,
            ratio: 1.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorBlock::sine())
    }

    pub fn noise() -> Self {
        Self::new(OscillatorBlock::noise())
    }

    /// Pin to an absolute frequency, ignoring the struck pitch
    pub fn with_frequency(mut self, freq: f32) -> Self {
        self.fixed_frequency = Some(freq);
        self
    }

    /// Track the struck pitch at `ratio` times its frequency
    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }

    fn frequency(&self, ctx: &RenderCtx) -> f32 {
        self.fixed_frequency.unwrap_or(ctx.frequency * self.ratio)
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let ctx = RenderCtx {
            frequency: self.frequency(ctx),
            ..*ctx
        };
        self.osc.render(out, &ctx);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        // Every strike starts at phase zero so the click waveform is identical
        self.osc.reset();
    }
}
