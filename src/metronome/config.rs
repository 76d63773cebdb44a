#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::clicks::ClickStyle;

/// Which clicks get the accented sound
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccentPolicy {
    /// Every beat uses the regular click
    #[default]
    Uniform,
    /// The first beat of each bar uses the downbeat click
    Downbeat,
}

/// Metronome tuning.
///
/// The click shape fields describe the gain envelope applied to every click
/// in the rendered track: a linear ramp from 0 over `attack`, then an
/// exponential fall to `decay_floor` at `decay_fraction * click_duration`,
/// silence until `click_duration`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct MetronomeConfig {
    /// Seconds each click occupies in the track
    pub click_duration: f32,
    /// Seconds of linear attack
    pub attack: f32,
    pub decay_fraction: f32,
    pub decay_floor: f32,
    /// Multiplier from user volume (0..1) to output gain
    pub gain_boost: f32,
    /// Volume before the first `set_volume`
    pub volume: f32,
    pub style: ClickStyle,
    pub accent: AccentPolicy,
    /// Longest track `generate_track` will render, in seconds
    pub max_track_duration: f64,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            click_duration: 0.06,
            attack: 0.002,
            decay_fraction: 0.8,
            decay_floor: 0.001,
            gain_boost: 3.0,
            volume: 0.5,
            style: ClickStyle::Traditional,
            accent: AccentPolicy::Uniform,
            max_track_duration: 30.0 * 60.0,
        }
    }
}

impl MetronomeConfig {
    /// Seconds from onset to the end of the decay
    pub fn decay_end(&self) -> f32 {
        self.click_duration * self.decay_fraction.clamp(0.0, 1.0)
    }

    /// Output gain for a user volume
    pub fn gain_for(&self, volume: f32) -> f32 {
        volume.clamp(0.0, 1.0) * self.gain_boost
    }
}
