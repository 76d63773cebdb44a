//! Pull-driven backend: no device, the caller renders frames on demand.
//!
//! Used by tests and by offline targets that still want the scheduling
//! behaviour of a live context.

use std::sync::{Arc, Mutex, PoisonError};

use super::{
    backend::{AudioBackend, BackendStream},
    graph::GraphRenderer,
};
use crate::error::{ClockError, ClockResult};

type RendererSlot = Arc<Mutex<Option<GraphRenderer>>>;

pub struct HeadlessBackend {
    sample_rate: u32,
    slot: RendererSlot,
}

impl HeadlessBackend {
    /// Backend plus the driver that pulls audio out of it.
    pub fn new(sample_rate: u32) -> (Self, HeadlessDriver) {
        let slot: RendererSlot = Arc::new(Mutex::new(None));
        let backend = Self {
            sample_rate,
            slot: slot.clone(),
        };
        (backend, HeadlessDriver { sample_rate, slot })
    }
}

impl AudioBackend for HeadlessBackend {
    fn open(&self, renderer: GraphRenderer) -> ClockResult<Box<dyn BackendStream>> {
        if self.sample_rate == 0 {
            return Err(ClockError::Config("sample rate must be non-zero".into()));
        }
        // A new context replaces whatever the previous one left behind
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(renderer);
        Ok(Box::new(HeadlessStream {
            sample_rate: self.sample_rate,
        }))
    }
}

struct HeadlessStream {
    sample_rate: u32,
}

impl BackendStream for HeadlessStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self) -> ClockResult<()> {
        Ok(())
    }

    fn pause(&self) -> ClockResult<()> {
        Ok(())
    }
}

/// Renders audio from the most recently opened headless context.
#[derive(Clone)]
pub struct HeadlessDriver {
    sample_rate: u32,
    slot: RendererSlot,
}

impl HeadlessDriver {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Render `frames` mono frames in blocks of at most `MAX_BLOCK_SIZE`.
    ///
    /// Silence when no context has been opened or it is suspended.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(renderer) = slot.as_mut() {
            for block in out.chunks_mut(crate::MAX_BLOCK_SIZE) {
                renderer.render(block, 1);
            }
        }
        out
    }

    /// Render `seconds` of audio, rounded to whole frames.
    pub fn render_seconds(&self, seconds: f64) -> Vec<f32> {
        let frames = (seconds.max(0.0) * self.sample_rate as f64).round() as usize;
        self.render(frames)
    }
}
