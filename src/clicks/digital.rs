//! Digital click - a short, bright electronic beep.
//!
//! Odd harmonics only (1x, 3x, 5x), which reads as a square-ish "beep"
//! without the aliasing of a naive square wave. Very short decay.

use super::SynthRecipe;
use crate::graph::{envelope::EnvNode, extensions::NodeExt, oscillator::OscNode, GraphNode};

pub(crate) const RECIPE: SynthRecipe = SynthRecipe {
    regular_hz: 1_800.0,
    downbeat_hz: 2_400.0,
    length: 0.05,
    build,
};

/// Create a digital click voice.
pub fn digital() -> impl GraphNode {
    OscNode::sine()
        .mix(OscNode::sine().with_ratio(3.0), 0.25)
        .mix(OscNode::sine().with_ratio(5.0), 0.12)
        .amplify(EnvNode::percussive(0.0005, 0.025))
}

fn build() -> Box<dyn GraphNode> {
    Box::new(digital())
}
