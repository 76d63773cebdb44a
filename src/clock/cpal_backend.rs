use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{
    backend::{AudioBackend, BackendStream},
    graph::GraphRenderer,
};
use crate::error::{ClockError, ClockResult};

/// Default output device of the default cpal host.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl AudioBackend for CpalBackend {
    fn open(&self, mut renderer: GraphRenderer) -> ClockResult<Box<dyn BackendStream>> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(ClockError::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| ClockError::Config(e.to_string()))?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(ClockError::UnsupportedFormat(format!(
                "{:?}",
                config.sample_format()
            )));
        }

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        log::info!(
            "Opening output '{}' at {} Hz, {} channels",
            device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels
        );

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| renderer.render(data, channels),
                |err| log::error!("Audio stream error: {err}"),
                None,
            )
            .map_err(|e| ClockError::StreamBuild(e.to_string()))?;

        Ok(Box::new(CpalStream {
            stream,
            sample_rate,
        }))
    }
}

struct CpalStream {
    stream: cpal::Stream,
    sample_rate: u32,
}

impl BackendStream for CpalStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self) -> ClockResult<()> {
        self.stream
            .play()
            .map_err(|e| ClockError::StreamState(e.to_string()))
    }

    fn pause(&self) -> ClockResult<()> {
        self.stream
            .pause()
            .map_err(|e| ClockError::StreamState(e.to_string()))
    }
}
