//! Immutable mono sample buffers shared between the offline renderer, the
//! click synthesizers and the real-time graph.

use std::sync::Arc;

/// A mono block of samples at a fixed sample rate.
///
/// Cloning is cheap: the samples live behind an `Arc<[f32]>` so the same
/// buffer can be handed to the audio thread while the control side keeps it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub(crate) fn shared_samples(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Absolute peak amplitude
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    /// Scale so the absolute peak equals `target`. Silent buffers are returned
    /// unchanged.
    pub fn normalized(&self, target: f32) -> Self {
        let peak = self.peak();
        if peak <= f32::EPSILON {
            return self.clone();
        }
        let scale = target / peak;
        Self::new(
            self.samples.iter().map(|s| s * scale).collect(),
            self.sample_rate,
        )
    }

    /// Linear-interpolation resample to `target_rate`.
    pub fn resampled(&self, target_rate: u32) -> Self {
        if target_rate == self.sample_rate {
            return self.clone();
        }
        if self.is_empty() || self.sample_rate == 0 || target_rate == 0 {
            return Self::new(self.samples.to_vec(), target_rate);
        }

        let ratio = self.sample_rate as f64 / target_rate as f64;
        let out_len = ((self.len() as f64) / ratio).round().max(1.0) as usize;
        let last = self.len() - 1;

        let samples = (0..out_len)
            .map(|i| {
                let pos = i as f64 * ratio;
                let idx = (pos.floor() as usize).min(last);
                let next = (idx + 1).min(last);
                let frac = (pos - idx as f64) as f32;
                self.samples[idx] + (self.samples[next] - self.samples[idx]) * frac
            })
            .collect();

        Self::new(samples, target_rate)
    }
}
