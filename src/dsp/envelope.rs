use crate::{graph::node::RenderCtx, MIN_TIME};

/*
Percussive Envelope
===================

Clicks are struck, not held. There is no sustain stage and no note_off: the
envelope ramps up once and then rings out on its own.

  Level
   peak ┐ ╱╲
        │╱  ╲
        │    ╲_
        │      ╲__
  floor └─────────╲______→ Time
        |A|   Decay (D)

Attack is a LINEAR ramp from exactly 0.0 at the trigger sample up to `peak`
over `attack_time`. The first rendered sample is always 0.0, so an onset never
starts on a discontinuity.

Decay is EXPONENTIAL: each sample multiplies the level by a constant
coefficient, which is how struck objects actually lose energy. The coefficient
is chosen so the level lands on `floor` after exactly `decay_time` seconds:

    coeff = (floor / peak) ^ (1 / (decay_time * sample_rate))

With floor = 0.001 that is a -60 dB fall. Once the level crosses the floor the
envelope snaps to 0.0 and goes idle, so the tail is exactly silent.

    ┌──────┐ note_on ┌────────┐ level=peak ┌───────┐ level<=floor ┌──────┐
    │ Idle │───────→ │ Attack │──────────→ │ Decay │────────────→ │ Idle │
    └──────┘         └────────┘            └───────┘              └──────┘

note_on always restarts from zero, so retriggering mid-decay is clean.
*/

/// Which phase of the percussive envelope is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
}

/// Default decay floor (-60 dB)
pub const DEFAULT_FLOOR: f32 = 0.001;

pub struct Envelope {
    attack_time: f32, // seconds to ramp 0 -> peak
    decay_time: f32,  // seconds to fall peak -> floor
    peak: f32,
    floor: f32,

    stage: EnvelopeStage,
    level: f32,

    attack_elapsed: u32,
    attack_total: u32,
    decay_coeff: f32,
}

impl Envelope {
    pub fn percussive(attack: f32, decay: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            peak: 1.0,
            floor: DEFAULT_FLOOR,

            stage: EnvelopeStage::Idle,
            level: 0.0,
            attack_elapsed: 0,
            attack_total: 1,
            decay_coeff: 0.0,
        }
    }

    pub fn with_peak(mut self, peak: f32) -> Self {
        self.peak = peak.max(0.0);
        self
    }

    pub fn with_floor(mut self, floor: f32) -> Self {
        self.floor = floor.max(f32::MIN_POSITIVE);
        self
    }

    /// Trigger: restart the attack from zero.
    pub fn note_on(&mut self, ctx: &RenderCtx) {
        self.level = 0.0;
        self.attack_elapsed = 0;
        self.attack_total = (self.attack_time * ctx.sample_rate).round().max(1.0) as u32;

        let decay_samples = (self.decay_time * ctx.sample_rate).max(1.0);
        self.decay_coeff = if self.peak > self.floor {
            (self.floor / self.peak).powf(1.0 / decay_samples)
        } else {
            0.0
        };

        self.stage = EnvelopeStage::Attack;
    }

    /// Advance one sample.
    pub fn next_sample(&mut self) {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                let progress = self.attack_elapsed as f32 / self.attack_total as f32;
                self.level = self.peak * progress;
                self.attack_elapsed += 1;

                if self.attack_elapsed > self.attack_total {
                    self.level = self.peak;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                self.level *= self.decay_coeff;

                if self.level <= self.floor {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            self.next_sample();
            *sample = self.level;
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeStage::Idle)
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.attack_elapsed = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
