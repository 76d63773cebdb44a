//! Bell click - a metallic "ting".
//!
//! Bells are not harmonic: their modes sit at non-integer multiples of the
//! strike tone. Four partials at roughly 1x, 2.76x, 5.4x and 8.93x, each with
//! its own decay (higher modes die first), approximate a small bar bell.
//! The slower envelope lets the ring carry past the other styles' tails.

use super::SynthRecipe;
use crate::graph::{envelope::EnvNode, extensions::NodeExt, oscillator::OscNode, GraphNode};

pub(crate) const RECIPE: SynthRecipe = SynthRecipe {
    regular_hz: 1_200.0,
    downbeat_hz: 1_600.0,
    length: 0.25,
    build,
};

/// Partial ratios of the strike tone
pub const PARTIALS: [f32; 4] = [1.0, 2.76, 5.4, 8.93];

fn partial(ratio: f32, decay: f32) -> impl GraphNode {
    OscNode::sine()
        .with_ratio(ratio)
        .amplify(EnvNode::percussive(0.002, decay))
}

/// Create a bell click voice.
pub fn bell() -> impl GraphNode {
    partial(PARTIALS[0], 0.25)
        .mix(partial(PARTIALS[1], 0.18), 0.4)
        .mix(partial(PARTIALS[2], 0.12), 0.25)
        .mix(partial(PARTIALS[3], 0.08), 0.15)
}

fn build() -> Box<dyn GraphNode> {
    Box::new(bell())
}
