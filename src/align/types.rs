#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Label the ML service emits for "no chord"
pub const DETECTED_NO_CHORD: &str = "N";

/// Label used in aligned output for beats with no harmony
pub const NO_CHORD: &str = "N/C";

/// A chord recognized by the analysis service.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ChordDetection {
    pub chord: String,
    /// Onset in seconds
    pub start: f64,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub end: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub confidence: Option<f32>,
}

impl ChordDetection {
    pub fn new(chord: impl Into<String>, start: f64) -> Self {
        Self {
            chord: chord.into(),
            start,
            end: None,
            confidence: None,
        }
    }

    /// Output label: the detection sentinel becomes `"N/C"`
    pub fn label(&self) -> &str {
        if self.chord == DETECTED_NO_CHORD {
            NO_CHORD
        } else {
            &self.chord
        }
    }
}

/// One detected beat. Its position in the beat list is its beat index.
///
/// Deserializes from either a bare timestamp or a full object.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "BeatRepr", rename_all = "camelCase"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    pub time: f64,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub beat_num: Option<u32>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub confidence: Option<f32>,
}

impl BeatEvent {
    pub fn at(time: f64) -> Self {
        Self {
            time,
            beat_num: None,
            confidence: None,
        }
    }
}

impl From<f64> for BeatEvent {
    fn from(time: f64) -> Self {
        Self::at(time)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(untagged)]
enum BeatRepr {
    Time(f64),
    #[serde(rename_all = "camelCase")]
    Full {
        time: f64,
        #[serde(default)]
        beat_num: Option<u32>,
        #[serde(default)]
        confidence: Option<f32>,
    },
}

#[cfg(feature = "serde")]
impl From<BeatRepr> for BeatEvent {
    fn from(repr: BeatRepr) -> Self {
        match repr {
            BeatRepr::Time(time) => BeatEvent::at(time),
            BeatRepr::Full {
                time,
                beat_num,
                confidence,
            } => BeatEvent {
                time,
                beat_num,
                confidence,
            },
        }
    }
}

/// The chord sounding at one beat.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizedChord {
    pub chord: String,
    pub beat_index: usize,
}
