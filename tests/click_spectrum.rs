use beatsync::clicks::{load_clicks, ClickStyle, NoSamples, BELL_PARTIALS};
use rustfft::{num_complex::Complex, FftPlanner};

const SR: u32 = 48_000;
const FFT_SIZE: usize = 16_384;

/// Magnitude spectrum of a zero-padded buffer, bins 0..FFT_SIZE/2
fn spectrum(samples: &[f32]) -> Vec<f32> {
    let mut bins: Vec<Complex<f32>> = samples
        .iter()
        .take(FFT_SIZE)
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(FFT_SIZE)
        .collect();

    FftPlanner::new().plan_fft_forward(FFT_SIZE).process(&mut bins);
    bins[..FFT_SIZE / 2].iter().map(|c| c.norm()).collect()
}

fn bin_hz(bin: usize) -> f32 {
    bin as f32 * SR as f32 / FFT_SIZE as f32
}

fn hz_bin(hz: f32) -> usize {
    (hz * FFT_SIZE as f32 / SR as f32).round() as usize
}

fn dominant_hz(samples: &[f32]) -> f32 {
    let mags = spectrum(samples);
    let (bin, _) = mags
        .iter()
        .enumerate()
        .skip(1)
        .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
    bin_hz(bin)
}

fn assert_near(actual: f32, expected: f32, style: ClickStyle) {
    assert!(
        (actual - expected).abs() / expected < 0.015,
        "{style}: dominant {actual:.1} Hz, expected {expected:.1} Hz"
    );
}

#[test]
fn procedural_styles_ring_at_their_pitch() {
    for (style, regular, downbeat) in [
        (ClickStyle::Traditional, 1_000.0, 1_500.0),
        (ClickStyle::Digital, 1_800.0, 2_400.0),
        (ClickStyle::Wood, 800.0, 1_100.0),
        (ClickStyle::Bell, 1_200.0, 1_600.0),
    ] {
        let set = load_clicks(style, true, SR, &NoSamples);
        assert_near(dominant_hz(set.regular.samples()), regular, style);
        let accent = set.downbeat.expect("downbeat requested");
        assert_near(dominant_hz(accent.samples()), downbeat, style);
    }
}

#[test]
fn bell_has_inharmonic_partials() {
    let set = load_clicks(ClickStyle::Bell, false, SR, &NoSamples);
    let mags = spectrum(set.regular.samples());

    for ratio in &BELL_PARTIALS[1..] {
        let peak = hz_bin(1_200.0 * ratio);
        // A partial stands well above the spectrum halfway to the next harmonic
        let valley = hz_bin(1_200.0 * (ratio + 0.5));
        assert!(
            mags[peak] > 10.0 * mags[valley],
            "partial {ratio}: {} vs {}",
            mags[peak],
            mags[valley]
        );
    }
}

#[test]
fn noisy_styles_render_identically_every_time() {
    for style in [ClickStyle::Wood, ClickStyle::Bell] {
        let a = load_clicks(style, true, SR, &NoSamples);
        let b = load_clicks(style, true, SR, &NoSamples);
        assert_eq!(a.regular, b.regular, "{style}");
        assert_eq!(a.downbeat, b.downbeat, "{style}");
    }
}
