use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Noise,
}

/// Phase-accumulating oscillator.
///
/// Noise uses a fixed-seed xorshift generator so every rendered click is
/// bit-identical between runs.
pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
    rng_state: u32,
}

const NOISE_SEED: u32 = 0x9E37_79B9;

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
            rng_state: NOISE_SEED,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn noise() -> Self {
        Self::new(OscillatorWaveform::Noise)
    }

    /// Restart at phase zero (and reseed noise).
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.rng_state = NOISE_SEED;
    }

    pub fn render(&mut self, destination: &mut [f32], ctx: &RenderCtx) {
        match self.waveform {
            OscillatorWaveform::Sine => {
                let increment = ctx.frequency / ctx.sample_rate;
                for sample in destination.iter_mut() {
                    *sample = (TAU * self.phase).sin();
                    self.phase += increment;
                    if self.phase >= 1.0 {
                        self.phase -= 1.0;
                    }
                }
            }
            OscillatorWaveform::Noise => {
                for sample in destination.iter_mut() {
                    *sample = self.next_noise();
                }
            }
        }
    }

    #[inline]
    fn next_noise(&mut self) -> f32 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng_state = x;
        // Map to [-1, 1)
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}
