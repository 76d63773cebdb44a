//! Chord-to-beat alignment.
//!
//! Chord detections arrive sparse and at arbitrary times; the UI addresses
//! everything by beat index. Alignment snaps each chord onto its nearest beat
//! and forward-fills, so every beat carries exactly one label.
//!
//! Two snapping strategies are kept side by side and must agree exactly on
//! sorted input:
//!
//! - [`ChordBeatAligner::align`]: two-pointer sweep, O(n + m)
//! - [`ChordBeatAligner::align_by_search`]: binary search per chord, O(n log m)
//!
//! ```ignore
//! use beatsync::align::{align, BeatEvent, ChordDetection};
//!
//! let beats: Vec<BeatEvent> = [0.0, 1.0, 2.0, 3.0].map(BeatEvent::at).to_vec();
//! let chords = vec![ChordDetection::new("C", 0.0), ChordDetection::new("G", 2.0)];
//! let labels: Vec<_> = align(&chords, &beats).into_iter().map(|c| c.chord).collect();
//! assert_eq!(labels, ["C", "C", "G", "G"]);
//! ```

mod types;

pub use types::{BeatEvent, ChordDetection, SynchronizedChord, DETECTED_NO_CHORD, NO_CHORD};

/// Chords farther than this from every beat are dropped
pub const MATCH_THRESHOLD_SECS: f64 = 2.0;

/// Snaps chord detections onto a beat grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordBeatAligner {
    threshold: f64,
}

impl Default for ChordBeatAligner {
    fn default() -> Self {
        Self {
            threshold: MATCH_THRESHOLD_SECS,
        }
    }
}

impl ChordBeatAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom matching threshold in seconds
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// One label per beat, using the two-pointer sweep.
    pub fn align(&self, chords: &[ChordDetection], beats: &[BeatEvent]) -> Vec<SynchronizedChord> {
        let assigned = self.assign_sweep(chords, beats);
        forward_fill(chords, &assigned)
    }

    /// One label per beat, using a binary search per chord.
    pub fn align_by_search(
        &self,
        chords: &[ChordDetection],
        beats: &[BeatEvent],
    ) -> Vec<SynchronizedChord> {
        let assigned = self.assign_search(chords, beats);
        forward_fill(chords, &assigned)
    }

    /// Direct chord assignment per beat (index into `chords`).
    ///
    /// The cursor never moves backwards; it always rests on the first beat of
    /// a run of identical timestamps, so equidistant candidates resolve to the
    /// earlier beat.
    fn assign_sweep(&self, chords: &[ChordDetection], beats: &[BeatEvent]) -> Vec<Option<usize>> {
        let mut assigned = vec![None; beats.len()];
        if beats.is_empty() {
            return assigned;
        }

        let mut cursor = 0;
        let mut next = next_group(beats, cursor);
        let mut dropped = 0usize;

        for (chord_idx, chord) in chords.iter().enumerate() {
            let t = chord.start;
            while next < beats.len() && (beats[next].time - t).abs() < (beats[cursor].time - t).abs() {
                cursor = next;
                next = next_group(beats, cursor);
            }

            if (beats[cursor].time - t).abs() <= self.threshold {
                // Later chords overwrite earlier ones on the same beat
                assigned[cursor] = Some(chord_idx);
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            log::debug!(
                "{dropped} of {} chords farther than {}s from any beat",
                chords.len(),
                self.threshold
            );
        }

        assigned
    }

    fn assign_search(&self, chords: &[ChordDetection], beats: &[BeatEvent]) -> Vec<Option<usize>> {
        let mut assigned = vec![None; beats.len()];
        if beats.is_empty() {
            return assigned;
        }

        for (chord_idx, chord) in chords.iter().enumerate() {
            let t = chord.start;
            // First beat at or after t
            let right = beats.partition_point(|b| b.time < t);

            let nearest = if right == 0 {
                0
            } else if right == beats.len() {
                group_start(beats, right - 1)
            } else {
                let left = group_start(beats, right - 1);
                if (beats[right].time - t).abs() < (beats[left].time - t).abs() {
                    right
                } else {
                    left
                }
            };

            if (beats[nearest].time - t).abs() <= self.threshold {
                assigned[nearest] = Some(chord_idx);
            }
        }

        assigned
    }
}

/// Index of the first beat after the run of beats sharing `beats[i].time`.
fn next_group(beats: &[BeatEvent], i: usize) -> usize {
    let time = beats[i].time;
    let mut j = i + 1;
    while j < beats.len() && beats[j].time == time {
        j += 1;
    }
    j
}

/// Index of the first beat sharing `beats[i].time`.
fn group_start(beats: &[BeatEvent], i: usize) -> usize {
    let time = beats[i].time;
    beats[..=i].partition_point(|b| b.time < time)
}

fn forward_fill(chords: &[ChordDetection], assigned: &[Option<usize>]) -> Vec<SynchronizedChord> {
    let mut current = NO_CHORD;
    assigned
        .iter()
        .enumerate()
        .map(|(beat_index, slot)| {
            if let Some(chord_idx) = slot {
                current = chords[*chord_idx].label();
            }
            SynchronizedChord {
                chord: current.to_string(),
                beat_index,
            }
        })
        .collect()
}

/// Align with the default threshold (two-pointer sweep).
pub fn align(chords: &[ChordDetection], beats: &[BeatEvent]) -> Vec<SynchronizedChord> {
    ChordBeatAligner::default().align(chords, beats)
}

/// Align with the default threshold (binary search).
pub fn align_by_search(chords: &[ChordDetection], beats: &[BeatEvent]) -> Vec<SynchronizedChord> {
    ChordBeatAligner::default().align_by_search(chords, beats)
}

/// Beat sounding at `time`: the last beat at or before it.
///
/// `None` before the first beat (or with no beats).
pub fn beat_index_at(beats: &[BeatEvent], time: f64) -> Option<usize> {
    beats.partition_point(|b| b.time <= time).checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beats(times: &[f64]) -> Vec<BeatEvent> {
        times.iter().copied().map(BeatEvent::at).collect()
    }

    fn chords(list: &[(&str, f64)]) -> Vec<ChordDetection> {
        list.iter().map(|&(c, t)| ChordDetection::new(c, t)).collect()
    }

    fn labels(result: &[SynchronizedChord]) -> Vec<&str> {
        result.iter().map(|c| c.chord.as_str()).collect()
    }

    fn both(c: &[ChordDetection], b: &[BeatEvent]) -> Vec<SynchronizedChord> {
        let sweep = align(c, b);
        assert_eq!(sweep, align_by_search(c, b));
        sweep
    }

    #[test]
    fn forward_fill_between_changes() {
        let result = both(&chords(&[("C", 0.0), ("G", 2.0)]), &beats(&[0.0, 1.0, 2.0, 3.0]));
        assert_eq!(labels(&result), ["C", "C", "G", "G"]);
        let indices: Vec<usize> = result.iter().map(|c| c.beat_index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn empty_chords_fill_with_no_chord() {
        let result = both(&[], &beats(&[0.0, 0.5, 1.0]));
        assert_eq!(labels(&result), [NO_CHORD; 3]);
    }

    #[test]
    fn empty_beats_give_empty_result() {
        assert!(both(&chords(&[("C", 0.0)]), &[]).is_empty());
        assert!(both(&[], &[]).is_empty());
    }

    #[test]
    fn distant_chord_is_dropped() {
        let result = both(&chords(&[("C", 10.0)]), &beats(&[0.0, 1.0, 2.0]));
        assert_eq!(labels(&result), [NO_CHORD; 3]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let result = both(&chords(&[("D", 4.0)]), &beats(&[0.0, 1.0, 2.0]));
        assert_eq!(labels(&result), [NO_CHORD, NO_CHORD, "D"]);

        let strict = ChordBeatAligner::with_threshold(1.5);
        assert_eq!(
            labels(&strict.align(&chords(&[("D", 4.0)]), &beats(&[0.0, 1.0, 2.0]))),
            [NO_CHORD; 3]
        );
    }

    #[test]
    fn chord_before_first_beat_maps_to_beat_zero() {
        let result = both(&chords(&[("Em", -0.7)]), &beats(&[0.3, 0.8, 1.3]));
        assert_eq!(labels(&result), ["Em", "Em", "Em"]);
    }

    #[test]
    fn later_chord_wins_shared_beat() {
        let result = both(
            &chords(&[("C", 0.9), ("F", 1.1), ("G", 3.0)]),
            &beats(&[0.0, 1.0, 2.0, 3.0]),
        );
        assert_eq!(labels(&result), [NO_CHORD, "F", "F", "G"]);
    }

    #[test]
    fn detection_sentinel_is_normalized() {
        let result = both(&chords(&[("A", 0.0), ("N", 1.0)]), &beats(&[0.0, 1.0, 2.0]));
        assert_eq!(labels(&result), ["A", NO_CHORD, NO_CHORD]);
    }

    #[test]
    fn equidistant_chord_takes_earlier_beat() {
        let result = both(&chords(&[("Bb", 1.5)]), &beats(&[1.0, 2.0]));
        assert_eq!(labels(&result), ["Bb", "Bb"]);
        assert_eq!(align(&chords(&[("Bb", 1.5), ("C", 2.0)]), &beats(&[1.0, 2.0]))[0].chord, "Bb");
    }

    #[test]
    fn duplicate_beats_resolve_to_first_of_run() {
        let b = beats(&[0.0, 5.0, 5.0, 6.0]);
        let result = both(&chords(&[("C", 5.2), ("D", 5.8)]), &b);
        assert_eq!(labels(&result), [NO_CHORD, "C", "C", "D"]);
    }

    #[test]
    fn cursor_keeps_position_across_chords() {
        let b = beats(&[0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);
        let c = chords(&[("C", 0.1), ("Am", 1.05), ("F", 1.9), ("G", 2.95)]);
        assert_eq!(labels(&both(&c, &b)), ["C", "C", "Am", "Am", "F", "F", "G"]);
    }

    #[test]
    fn malformed_input_does_not_panic() {
        let b = beats(&[2.0, f64::NAN, 1.0, 0.0]);
        let c = chords(&[("C", 3.0), ("D", f64::NAN), ("E", -1.0)]);
        assert_eq!(align(&c, &b).len(), 4);
        assert_eq!(align_by_search(&c, &b).len(), 4);
    }

    #[test]
    fn beat_lookup_by_time() {
        let b = beats(&[0.5, 1.0, 1.5]);
        assert_eq!(beat_index_at(&b, 0.2), None);
        assert_eq!(beat_index_at(&b, 0.5), Some(0));
        assert_eq!(beat_index_at(&b, 1.49), Some(1));
        assert_eq!(beat_index_at(&b, 99.0), Some(2));
        assert_eq!(beat_index_at(&[], 1.0), None);
    }
}
