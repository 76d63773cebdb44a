use std::f32::consts::PI;

use crate::graph::node::RenderCtx;

/*
Topology-preserving state-variable filter (Zavalishin/Simper form), band-pass
output. Gives noise bursts the pitched "knock" of a wood block.

    gain
     │        ╱‾‾╲
     │      ╱      ╲
     │   ╱            ╲
     │╱                  ╲___
     └────────┬─────────────── freq
            cutoff

Resonance narrows the peak around the cutoff.
*/

pub struct SVFilter {
    ic1eq: f32,
    ic2eq: f32,

    cutoff_hz: f32,
    /// 0.0 = no emphasis, approaching 1.0 = self-oscillation
    resonance: f32,
}

impl SVFilter {
    pub fn bandpass(cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance: 0.0,
        }
    }

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.resonance = resonance.clamp(0.0, 0.99);
        self
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        // Keep the cutoff below Nyquist or tan() blows up
        let cutoff = self.cutoff_hz.clamp(10.0, ctx.sample_rate * 0.49);
        let g = (PI * cutoff / ctx.sample_rate).tan();
        let k = 2.0 - 2.0 * self.resonance;
        let h = 1.0 / (1.0 + g * (g + k));

        for sample in buffer.iter_mut() {
            let v3 = *sample - self.ic2eq;
            let v1 = h * (self.ic1eq + g * v3);
            let v2 = self.ic2eq + g * v1;
            self.ic1eq = 2.0 * v1 - self.ic1eq;
            self.ic2eq = 2.0 * v2 - self.ic2eq;
            *sample = v1;
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
