use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
    sync::atomic::Ordering,
};

use super::{
    backend::BackendStream,
    graph::{GainParam, GraphControl, SharedTransport, SourceId, StopSignal, Voice},
};
use crate::{
    buffer::AudioBuffer,
    error::{ClockError, ClockResult},
};

/// Lifecycle of an [`AudioContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Suspended,
    Running,
    Closed,
}

struct ContextInner {
    stream: Box<dyn BackendStream>,
    control: RefCell<GraphControl>,
    transport: SharedTransport,
    sample_rate: u32,
    state: Cell<ClockState>,
    next_id: Cell<u64>,
}

/// Handle to a live audio rendering context.
///
/// Cheap to clone; every clone refers to the same stream. Time is counted in
/// rendered frames, so it stands still while the context is suspended.
#[derive(Clone)]
pub struct AudioContext {
    inner: Rc<ContextInner>,
}

impl fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioContext")
            .field("sample_rate", &self.inner.sample_rate)
            .field("state", &self.inner.state.get())
            .field("frame", &self.current_frame())
            .finish()
    }
}

impl AudioContext {
    pub(crate) fn new(
        stream: Box<dyn BackendStream>,
        control: GraphControl,
    ) -> Self {
        let sample_rate = stream.sample_rate();
        Self {
            inner: Rc::new(ContextInner {
                stream,
                transport: control.transport.clone(),
                control: RefCell::new(control),
                sample_rate,
                state: Cell::new(ClockState::Suspended),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn state(&self) -> ClockState {
        self.inner.state.get()
    }

    /// Frames rendered so far
    pub fn current_frame(&self) -> u64 {
        self.inner.transport.frames.load(Ordering::Acquire)
    }

    /// Seconds of audio rendered so far; monotonic.
    pub fn current_time(&self) -> f64 {
        self.current_frame() as f64 / self.inner.sample_rate as f64
    }

    pub fn resume(&self) -> ClockResult<()> {
        match self.state() {
            ClockState::Closed => Err(ClockError::Closed),
            ClockState::Running => Ok(()),
            ClockState::Suspended => {
                self.inner.stream.play()?;
                self.inner.transport.running.store(true, Ordering::Release);
                self.inner.state.set(ClockState::Running);
                log::debug!("Audio context resumed at {:.3}s", self.current_time());
                Ok(())
            }
        }
    }

    /// Freeze the clock and silence output. The stream keeps pulling blocks
    /// so sources started or stopped meanwhile are still picked up.
    pub fn suspend(&self) -> ClockResult<()> {
        match self.state() {
            ClockState::Closed => Err(ClockError::Closed),
            ClockState::Suspended => Ok(()),
            ClockState::Running => {
                self.inner.transport.running.store(false, Ordering::Release);
                self.inner.state.set(ClockState::Suspended);
                log::debug!("Audio context suspended at {:.3}s", self.current_time());
                Ok(())
            }
        }
    }

    /// Stop rendering for good. Sources already scheduled never sound.
    pub fn close(&self) {
        if self.state() == ClockState::Closed {
            return;
        }
        self.inner.transport.running.store(false, Ordering::Release);
        if let Err(e) = self.inner.stream.pause() {
            log::warn!("Failed to pause stream while closing: {e}");
        }
        self.inner.state.set(ClockState::Closed);
        log::info!("Audio context closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ClockState::Closed
    }

    /// Whether both handles refer to the same context
    pub fn ptr_eq(&self, other: &AudioContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A gain stage whose value can change while sources play through it.
    pub fn create_gain(&self, value: f32) -> GainParam {
        GainParam::new(value)
    }

    /// Schedule `buffer` to start at context time `when` (seconds), playing
    /// from `offset` seconds into the buffer. A `when` in the past starts at
    /// the current frame.
    pub fn start_source(
        &self,
        buffer: &AudioBuffer,
        gain: &GainParam,
        when: f64,
        offset: f64,
    ) -> ClockResult<SourceHandle> {
        if self.is_closed() {
            return Err(ClockError::Closed);
        }

        let now = self.current_frame();
        let requested = (when.max(0.0) * self.inner.sample_rate as f64).round() as u64;
        let start_frame = requested.max(now);
        let offset = (offset.max(0.0) * buffer.sample_rate() as f64).round() as usize;

        let id = SourceId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let stop = StopSignal::new();
        let voice = Voice {
            samples: buffer.shared_samples(),
            start_frame,
            offset,
            stop: stop.clone(),
            gain: gain.clone(),
        };

        let mut control = self.inner.control.borrow_mut();
        let freed = control.collect_retired();
        if freed > 0 {
            log::trace!("Released {freed} finished sources");
        }
        control.starts.push(voice).map_err(|_| ClockError::QueueFull)?;

        log::trace!("Source {} scheduled at frame {start_frame}, offset {offset}", id.0);

        Ok(SourceHandle {
            id,
            stop,
            context: self.clone(),
        })
    }
}

/// A scheduled buffer playback. Stops when [`SourceHandle::stop`] is called;
/// dropping the handle leaves the source playing to its end.
#[derive(Debug)]
pub struct SourceHandle {
    id: SourceId,
    stop: StopSignal,
    context: AudioContext,
}

impl SourceHandle {
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Silence the source from the current frame on. Applies even while the
    /// context is suspended.
    pub fn stop(self) {
        if self.context.is_closed() {
            return;
        }
        self.stop.stop_at(self.context.current_frame());
        log::trace!("Source {} stopped", self.id.0);
    }
}
