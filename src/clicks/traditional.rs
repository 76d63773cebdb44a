//! Traditional click - the familiar "tock" of an electronic metronome.
//!
//! A sine fundamental with a quieter octave overtone. The overtone decays
//! faster than the fundamental, so the attack is bright and the tail round.

use super::SynthRecipe;
use crate::graph::{envelope::EnvNode, extensions::NodeExt, oscillator::OscNode, GraphNode};

pub(crate) const RECIPE: SynthRecipe = SynthRecipe {
    regular_hz: 1_000.0,
    downbeat_hz: 1_500.0,
    length: 0.06,
    build,
};

/// Create a traditional click voice.
pub fn traditional() -> impl GraphNode {
    OscNode::sine()
        .amplify(EnvNode::percussive(0.001, 0.04))
        .mix(
            OscNode::sine()
                .with_ratio(2.0)
                .amplify(EnvNode::percussive(0.001, 0.02)),
            0.25,
        )
}

fn build() -> Box<dyn GraphNode> {
    Box::new(traditional())
}
