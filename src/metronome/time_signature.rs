use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Meter of a click track. Every click is one beat of the numerator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u8,
    /// Note value that gets one beat (4 = quarter, 8 = eighth)
    pub denominator: u8,
}

impl TimeSignature {
    pub const FOUR_FOUR: TimeSignature = TimeSignature::new(4, 4);
    pub const THREE_FOUR: TimeSignature = TimeSignature::new(3, 4);
    pub const SIX_EIGHT: TimeSignature = TimeSignature::new(6, 8);

    pub const fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Clicks per bar; never zero
    pub fn beats_per_bar(&self) -> u32 {
        self.numerator.max(1) as u32
    }

    /// Whether click `k` (counting from 0 at track start) opens a bar
    pub fn is_downbeat(&self, k: usize) -> bool {
        k % self.beats_per_bar() as usize == 0
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time signature '{0}', expected e.g. 4/4")]
pub struct InvalidTimeSignature(pub String);

impl FromStr for TimeSignature {
    type Err = InvalidTimeSignature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTimeSignature(s.to_string());
        let (num, den) = s.trim().split_once('/').ok_or_else(invalid)?;
        let numerator: u8 = num.trim().parse().map_err(|_| invalid())?;
        let denominator: u8 = den.trim().parse().map_err(|_| invalid())?;
        if numerator == 0 || !denominator.is_power_of_two() {
            return Err(invalid());
        }
        Ok(Self::new(numerator, denominator))
    }
}
