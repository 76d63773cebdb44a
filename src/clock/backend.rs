use super::graph::GraphRenderer;
use crate::error::{ClockError, ClockResult};

/// Something that can drive a [`GraphRenderer`] in real time.
///
/// `open` is called once per audio context; the backend takes ownership of
/// the renderer and hands it to whatever thread pulls audio.
pub trait AudioBackend {
    fn open(&self, renderer: GraphRenderer) -> ClockResult<Box<dyn BackendStream>>;
}

/// A live output stream created by an [`AudioBackend`].
///
/// Dropping the stream releases the underlying device.
pub trait BackendStream {
    fn sample_rate(&self) -> u32;
    fn play(&self) -> ClockResult<()>;
    fn pause(&self) -> ClockResult<()>;
}

/// A backend for environments without audio output.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedBackend {
    reason: Option<String>,
}

impl UnsupportedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

impl AudioBackend for UnsupportedBackend {
    fn open(&self, _renderer: GraphRenderer) -> ClockResult<Box<dyn BackendStream>> {
        let reason = self
            .reason
            .clone()
            .unwrap_or_else(|| "no audio backend in this environment".to_string());
        Err(ClockError::Unsupported(reason))
    }
}
