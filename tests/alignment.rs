use beatsync::align::{align, align_by_search, BeatEvent, ChordBeatAligner, ChordDetection, NO_CHORD};
use rand::Rng;

const CHORDS: &[&str] = &["C", "G", "Am", "F", "N", "Dm7", "E"];

fn random_beats(rng: &mut impl Rng) -> Vec<BeatEvent> {
    let count = rng.random_range(0..60);
    let mut t = rng.random_range(-1.0..2.0);
    (0..count)
        .map(|_| {
            // Occasional duplicates exercise the tie rule
            if rng.random_bool(0.9) {
                t += rng.random_range(0.05..1.5);
            }
            BeatEvent::at(t)
        })
        .collect()
}

fn random_chords(rng: &mut impl Rng) -> Vec<ChordDetection> {
    let count = rng.random_range(0..30);
    let mut t: f64 = rng.random_range(-3.0..3.0);
    (0..count)
        .map(|_| {
            if rng.random_bool(0.85) {
                t += rng.random_range(0.0..6.0);
            }
            // Half-beat positions create exact ties between neighbours
            let start = if rng.random_bool(0.2) { (t * 2.0).round() / 2.0 } else { t };
            ChordDetection::new(CHORDS[rng.random_range(0..CHORDS.len())], start)
        })
        .collect()
}

#[test]
fn sweep_matches_binary_search_on_random_input() {
    let mut rng = rand::rng();
    for case in 0..1000 {
        let beats = random_beats(&mut rng);
        let chords = random_chords(&mut rng);
        assert_eq!(
            align(&chords, &beats),
            align_by_search(&chords, &beats),
            "case {case}: chords={chords:?} beats={beats:?}"
        );
    }
}

#[test]
fn output_covers_every_beat_once() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let beats = random_beats(&mut rng);
        let chords = random_chords(&mut rng);
        let result = align(&chords, &beats);

        assert_eq!(result.len(), beats.len());
        for (i, chord) in result.iter().enumerate() {
            assert_eq!(chord.beat_index, i);
            assert_ne!(chord.chord, "N");
        }
    }
}

#[test]
fn custom_threshold_agrees_across_strategies() {
    let mut rng = rand::rng();
    let aligner = ChordBeatAligner::with_threshold(0.25);
    for _ in 0..200 {
        let beats = random_beats(&mut rng);
        let chords = random_chords(&mut rng);
        assert_eq!(aligner.align(&chords, &beats), aligner.align_by_search(&chords, &beats));
    }
}

#[test]
fn song_with_intro_and_outro_silence() {
    let beats: Vec<BeatEvent> = (0..16).map(|i| BeatEvent::at(1.0 + i as f64 * 0.5)).collect();
    let chords = vec![
        ChordDetection::new("N", 0.0),
        ChordDetection::new("Am", 1.02),
        ChordDetection::new("F", 2.98),
        ChordDetection::new("C", 4.97),
        ChordDetection::new("N", 7.01),
        ChordDetection::new("G", 60.0),
    ];

    let labels: Vec<String> = align(&chords, &beats).into_iter().map(|c| c.chord).collect();
    let expected = [["Am"; 4], ["F"; 4], ["C"; 4], [NO_CHORD; 4]].concat();
    assert_eq!(labels, expected);
}
