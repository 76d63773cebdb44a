//! Wood block click.
//!
//! # How It Works
//!
//! 1. A burst of noise through a resonant bandpass gives the "knock"
//! 2. Two damped sine partials (1x and an inharmonic 2.3x) give the hollow
//!    body resonance
//! 3. The knock dies in ~12ms, the body rings a little longer
//!
//! The knock filter is pinned in absolute frequency; only the body follows
//! the accent pitch.

use super::SynthRecipe;
use crate::graph::{
    envelope::EnvNode, extensions::NodeExt, filter::FilterNode, oscillator::OscNode, GraphNode,
};

pub(crate) const RECIPE: SynthRecipe = SynthRecipe {
    regular_hz: 800.0,
    downbeat_hz: 1_100.0,
    length: 0.06,
    build,
};

/// Create a wood block click voice.
pub fn wood() -> impl GraphNode {
    let knock = OscNode::noise()
        .through(FilterNode::bandpass(2_500.0).with_resonance(0.6))
        .amplify(EnvNode::percussive(0.0005, 0.012));

    let body = OscNode::sine()
        .amplify(EnvNode::percussive(0.001, 0.05))
        .mix(
            OscNode::sine()
                .with_ratio(2.3)
                .amplify(EnvNode::percussive(0.001, 0.03)),
            0.35,
        );

    body.mix(knock, 0.35)
}

fn build() -> Box<dyn GraphNode> {
    Box::new(wood())
}
