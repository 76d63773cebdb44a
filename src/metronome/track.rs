use std::path::Path;

use super::{AccentPolicy, MetronomeConfig, TimeSignature};
use crate::{
    buffer::AudioBuffer,
    clicks::{ClickKind, ClickSet, ClickStyle},
    dsp::envelope::Envelope,
    error::{AssetError, AssetResult, RenderError, RenderResult},
    graph::RenderCtx,
};

/// What a track was rendered from. Two tracks with equal parameters are
/// sample-identical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackParams {
    pub duration: f64,
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub style: ClickStyle,
    pub accent: AccentPolicy,
}

impl TrackParams {
    /// Seconds between clicks
    pub fn interval(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn validate(&self, sample_rate: u32, max_duration: f64) -> RenderResult<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(RenderError::InvalidTempo(self.bpm));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(RenderError::InvalidDuration(self.duration));
        }
        if sample_rate == 0 {
            return Err(RenderError::InvalidSampleRate(sample_rate));
        }
        if self.duration > max_duration {
            return Err(RenderError::TooLong {
                seconds: self.duration,
                limit: max_duration,
            });
        }
        Ok(())
    }
}

/// A fully rendered click track: one mono buffer covering `[0, duration)`.
///
/// Immutable once built; the engine shares it with the audio thread.
#[derive(Debug, Clone)]
pub struct MetronomeTrack {
    buffer: AudioBuffer,
    params: TrackParams,
    click_frames: Vec<usize>,
}

impl MetronomeTrack {
    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    pub fn params(&self) -> &TrackParams {
        &self.params
    }

    pub fn duration(&self) -> f64 {
        self.params.duration
    }

    pub fn bpm(&self) -> f64 {
        self.params.bpm
    }

    pub fn style(&self) -> ClickStyle {
        self.params.style
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    /// Frame of each click onset, in order
    pub fn click_frames(&self) -> &[usize] {
        &self.click_frames
    }

    /// Seconds of each click onset, in order
    pub fn click_times(&self) -> impl Iterator<Item = f64> + '_ {
        let sr = self.sample_rate() as f64;
        self.click_frames.iter().map(move |&f| f as f64 / sr)
    }

    /// Whether `time` is a valid playback offset
    pub fn contains(&self, time: f64) -> bool {
        time >= 0.0 && time < self.params.duration
    }

    /// Write the track as a mono 32-bit float WAV.
    pub fn write_wav(&self, path: &Path) -> AssetResult<()> {
        let encode_err = |source| AssetError::Encode {
            path: path.to_path_buf(),
            source,
        };
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate(),
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(encode_err)?;
        for &sample in self.buffer.samples() {
            writer.write_sample(sample).map_err(encode_err)?;
        }
        writer.finalize().map_err(encode_err)?;

        log::info!(
            "Wrote {:.1}s click track to {}",
            self.duration(),
            path.display()
        );
        Ok(())
    }
}

/// Render a click track offline.
///
/// Click `k` starts at frame `round(k * 60 / bpm * sample_rate)` for every
/// `k * 60 / bpm < duration`. Clicks that would run past the end are cut.
pub fn render_track(
    clicks: &ClickSet,
    params: TrackParams,
    config: &MetronomeConfig,
) -> RenderResult<MetronomeTrack> {
    let sample_rate = clicks.regular.sample_rate();
    params.validate(sample_rate, config.max_track_duration)?;
    if clicks.regular.is_empty() {
        return Err(RenderError::EmptyClick);
    }

    let sr = sample_rate as f64;
    let total = (params.duration * sr).round() as usize;
    let interval = params.interval();

    let regular = shape_click(&clicks.regular, config);
    let downbeat = match params.accent {
        AccentPolicy::Downbeat => Some(shape_click(clicks.for_kind(ClickKind::Downbeat), config)),
        AccentPolicy::Uniform => None,
    };

    let mut samples = vec![0.0f32; total];
    let mut click_frames = Vec::with_capacity((params.duration / interval) as usize + 1);

    for k in 0.. {
        let onset = k as f64 * interval;
        if onset >= params.duration {
            break;
        }
        let frame = (onset * sr).round() as usize;
        if frame >= total {
            break;
        }

        let click = match &downbeat {
            Some(accent) if params.time_signature.is_downbeat(k) => accent,
            _ => &regular,
        };
        for (out, &s) in samples[frame..].iter_mut().zip(click) {
            *out += s;
        }
        click_frames.push(frame);
    }

    log::debug!(
        "Rendered {} clicks over {:.1}s at {} BPM ({})",
        click_frames.len(),
        params.duration,
        params.bpm,
        params.style
    );

    Ok(MetronomeTrack {
        buffer: AudioBuffer::new(samples, sample_rate),
        params,
        click_frames,
    })
}

/// One click, cut to `click_duration` and multiplied by the click envelope.
fn shape_click(click: &AudioBuffer, config: &MetronomeConfig) -> Vec<f32> {
    let sample_rate = click.sample_rate() as f32;
    let frames = (config.click_duration.max(0.0) * sample_rate).round() as usize;

    let attack = config.attack.max(0.0);
    let decay = (config.decay_end() - attack).max(0.0);
    let mut envelope = Envelope::percussive(attack, decay).with_floor(config.decay_floor);
    envelope.note_on(&RenderCtx::from_freq(sample_rate, 0.0, 1.0));

    let mut shaped = vec![0.0f32; frames];
    envelope.render(&mut shaped);
    for (gain, &s) in shaped.iter_mut().zip(click.samples().iter().chain(std::iter::repeat(&0.0))) {
        *gain *= s;
    }
    shaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 8_000;

    fn flat_clicks() -> ClickSet {
        ClickSet {
            style: ClickStyle::Traditional,
            regular: AudioBuffer::new(vec![1.0; 2_000], SR),
            downbeat: Some(AudioBuffer::new(vec![-1.0; 2_000], SR)),
        }
    }

    fn params(duration: f64, bpm: f64) -> TrackParams {
        TrackParams {
            duration,
            bpm,
            time_signature: TimeSignature::FOUR_FOUR,
            style: ClickStyle::Traditional,
            accent: AccentPolicy::Uniform,
        }
    }

    #[test]
    fn clicks_land_on_the_beat_grid() {
        let track = render_track(&flat_clicks(), params(10.0, 120.0), &MetronomeConfig::default()).unwrap();
        let expected: Vec<usize> = (0..20).map(|k| k * SR as usize / 2).collect();
        assert_eq!(track.click_frames(), expected.as_slice());
        assert_eq!(track.buffer().len(), 10 * SR as usize);
    }

    #[test]
    fn onset_is_silent_and_peaks_after_attack() {
        let config = MetronomeConfig::default();
        let track = render_track(&flat_clicks(), params(1.0, 60.0), &config).unwrap();
        let s = track.buffer().samples();

        assert_eq!(s[0], 0.0);
        // 2 ms at 8 kHz is 16 samples
        assert!(s[16] > 0.99);
        assert!(s[8] > 0.4 && s[8] < 0.6);
    }

    #[test]
    fn click_is_silent_after_decay() {
        let config = MetronomeConfig::default();
        let track = render_track(&flat_clicks(), params(1.0, 60.0), &config).unwrap();
        let s = track.buffer().samples();

        let decay_end = (config.decay_end() * SR as f32).round() as usize;
        assert!(s[decay_end + 2..].iter().all(|x| *x == 0.0));
        assert!(s[decay_end - 40] > 0.0);
    }

    #[test]
    fn downbeat_policy_accents_bar_starts() {
        let mut p = params(4.0, 120.0);
        p.accent = AccentPolicy::Downbeat;
        let track = render_track(&flat_clicks(), p, &MetronomeConfig::default()).unwrap();
        let s = track.buffer().samples();

        // Sample 16 of each click: negative on downbeats, positive elsewhere
        let signs: Vec<bool> = track.click_frames().iter().map(|&f| s[f + 16] < 0.0).collect();
        assert_eq!(signs, [true, false, false, false, true, false, false, false]);
    }

    #[test]
    fn last_click_is_truncated_at_track_end() {
        let track = render_track(&flat_clicks(), params(1.01, 60.0), &MetronomeConfig::default()).unwrap();
        assert_eq!(track.click_frames(), &[0, SR as usize]);
        assert_eq!(track.buffer().len(), (1.01 * SR as f64).round() as usize);
    }

    #[test]
    fn default_limit_covers_songs_not_hours() {
        let limit = MetronomeConfig::default().max_track_duration;
        assert!(params(25.0 * 60.0, 120.0).validate(48_000, limit).is_ok());
        assert_eq!(
            params(45.0 * 60.0, 120.0).validate(48_000, limit),
            Err(RenderError::TooLong {
                seconds: 2_700.0,
                limit: 1_800.0,
            })
        );
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let config = MetronomeConfig::default();
        let clicks = flat_clicks();
        assert_eq!(
            render_track(&clicks, params(10.0, 0.0), &config).unwrap_err(),
            RenderError::InvalidTempo(0.0)
        );
        assert!(matches!(
            render_track(&clicks, params(f64::NAN, 120.0), &config),
            Err(RenderError::InvalidDuration(_))
        ));
        assert!(matches!(
            render_track(&clicks, params(1e9, 120.0), &config),
            Err(RenderError::TooLong { .. })
        ));

        let empty = ClickSet {
            style: ClickStyle::Traditional,
            regular: AudioBuffer::new(Vec::new(), SR),
            downbeat: None,
        };
        assert_eq!(
            render_track(&empty, params(1.0, 60.0), &config).unwrap_err(),
            RenderError::EmptyClick
        );
    }

    #[test]
    fn wav_export_reads_back() {
        let track = render_track(&flat_clicks(), params(0.5, 240.0), &MetronomeConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clicks.wav");
        track.write_wav(&path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, SR);
        assert_eq!(reader.len() as usize, track.buffer().len());
    }
}
