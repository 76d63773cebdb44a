//! Analysis file as produced by the chord/beat detection service

use std::path::Path;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use serde::Deserialize;

use beatsync::align::{BeatEvent, ChordDetection};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(default)]
    pub chords: Vec<ChordDetection>,
    #[serde(default)]
    pub beats: Vec<BeatEvent>,
    #[serde(default)]
    pub bpm: Option<f64>,
}

impl Analysis {
    pub fn load(path: &Path) -> EyreResult<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        let analysis: Analysis =
            serde_json::from_str(&text).wrap_err_with(|| format!("invalid analysis {}", path.display()))?;

        let chords_sorted = analysis.chords.windows(2).all(|w| w[0].start <= w[1].start);
        let beats_sorted = analysis.beats.windows(2).all(|w| w[0].time <= w[1].time);
        if !(chords_sorted && beats_sorted) {
            log::warn!("{} is not in chronological order; alignment may be off", path.display());
        }
        if let Some(bpm) = analysis.bpm {
            log::info!("Analysis tempo: {bpm:.1} BPM");
        }
        Ok(analysis)
    }
}
