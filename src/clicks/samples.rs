//! Recorded click samples.
//!
//! Sample-based styles read mono or multichannel WAV files; multichannel
//! assets are averaged down to mono. Resampling to the clock rate happens in
//! the caller, once the target rate is known.

use std::path::{Path, PathBuf};

use crate::{
    buffer::AudioBuffer,
    error::{AssetError, AssetResult},
};

/// Where sample-based click styles get their audio from.
pub trait SampleSource {
    fn load(&self, asset: &str) -> AssetResult<AudioBuffer>;
}

impl<T: SampleSource + ?Sized> SampleSource for Box<T> {
    fn load(&self, asset: &str) -> AssetResult<AudioBuffer> {
        (**self).load(asset)
    }
}

/// WAV assets on disk under a fixed directory
#[derive(Debug, Clone)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SampleSource for AssetDir {
    fn load(&self, asset: &str) -> AssetResult<AudioBuffer> {
        decode_wav(&self.root.join(asset))
    }
}

/// A source with no assets; every sample-based style falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSamples;

impl SampleSource for NoSamples {
    fn load(&self, asset: &str) -> AssetResult<AudioBuffer> {
        Err(AssetError::Missing(asset.to_string()))
    }
}

/// Decode a WAV file to a mono buffer at its native rate.
pub fn decode_wav(path: &Path) -> AssetResult<AudioBuffer> {
    let decode_err = |source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let reader = hound::WavReader::open(path).map_err(decode_err)?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(AssetError::Format {
            path: path.to_path_buf(),
            reason: format!("{} channels at {} Hz", spec.channels, spec.sample_rate),
        });
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(decode_err)?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(decode_err)?
        }
    };

    let channels = spec.channels as usize;
    let mono: Vec<f32> = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    if mono.is_empty() {
        return Err(AssetError::Empty(path.to_path_buf()));
    }

    log::debug!(
        "Decoded {} ({} frames, {} ch, {} Hz)",
        path.display(),
        mono.len(),
        channels,
        spec.sample_rate
    );

    Ok(AudioBuffer::new(mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn stereo_int_wav_decodes_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");
        write_wav(&path, 2, &[16_384, 0, -16_384, -16_384]);

        let buffer = decode_wav(&path).unwrap();
        assert_eq!(buffer.sample_rate(), 22_050);
        assert_eq!(buffer.len(), 2);
        assert!((buffer.samples()[0] - 0.25).abs() < 1e-4);
        assert!((buffer.samples()[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = AssetDir::new(dir.path());
        assert!(matches!(
            source.load("nope.wav"),
            Err(AssetError::Decode { .. })
        ));
    }

    #[test]
    fn empty_wav_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, 1, &[]);
        assert!(matches!(decode_wav(&path), Err(AssetError::Empty(_))));
    }
}
