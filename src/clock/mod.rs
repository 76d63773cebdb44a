//! The shared audio clock.
//!
//! A [`TransportClock`] owns at most one live [`AudioContext`] at a time and
//! creates it lazily, the first time something asks for it. Every scheduled
//! sound is timed against that context's frame counter.
//!
//! ```text
//!   TransportClock::context()
//!          │
//!          ├── no context yet / closed ──► AudioBackend::open(GraphRenderer)
//!          │                                     │
//!          │                      Ok ◄───────────┴──────────► Err
//!          │                       │                           │
//!          │              AudioContext (Suspended)     cached; clock unusable
//!          ▼
//!   notify(Click | TouchStart | KeyDown | VisibilityRegained) ──► resume()
//! ```
//!
//! Output devices usually start suspended until the user interacts, so the
//! host forwards activation events through [`TransportClock::notify`].

mod backend;
mod context;
#[cfg(feature = "cpal-backend")]
mod cpal_backend;
mod graph;
mod headless;

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

pub use backend::{AudioBackend, BackendStream, UnsupportedBackend};
pub use context::{AudioContext, ClockState, SourceHandle};
#[cfg(feature = "cpal-backend")]
pub use cpal_backend::CpalBackend;
pub use graph::{GainParam, GraphRenderer, SourceId, COMMAND_QUEUE_SIZE};
pub use headless::{HeadlessBackend, HeadlessDriver};

use crate::error::{ClockError, ClockResult};

/// Host events that may unlock audio output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationEvent {
    Click,
    TouchStart,
    KeyDown,
    /// The host became visible again after being hidden
    VisibilityRegained,
}

impl ActivationEvent {
    /// Gestures are honoured once per context; visibility changes always are.
    pub fn is_gesture(self) -> bool {
        !matches!(self, ActivationEvent::VisibilityRegained)
    }
}

struct ClockInner {
    backend: Box<dyn AudioBackend>,
    context: RefCell<Option<AudioContext>>,
    failure: RefCell<Option<String>>,
    gesture_armed: Cell<bool>,
    resuming: Cell<bool>,
}

/// Resets the in-flight flag however the resume attempt ends.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Lazily created, shared audio clock. Clones share the same context.
#[derive(Clone)]
pub struct TransportClock {
    inner: Rc<ClockInner>,
}

impl TransportClock {
    pub fn new(backend: impl AudioBackend + 'static) -> Self {
        Self {
            inner: Rc::new(ClockInner {
                backend: Box::new(backend),
                context: RefCell::new(None),
                failure: RefCell::new(None),
                gesture_armed: Cell::new(false),
                resuming: Cell::new(false),
            }),
        }
    }

    /// Clock on the default output device.
    #[cfg(feature = "cpal-backend")]
    pub fn system() -> Self {
        Self::new(CpalBackend::new())
    }

    /// The live context, created on first access.
    ///
    /// If creation ever fails the error is remembered and every later call
    /// returns [`ClockError::Unavailable`]. A closed context is replaced.
    pub fn context(&self) -> ClockResult<AudioContext> {
        if let Some(reason) = self.inner.failure.borrow().as_ref() {
            return Err(ClockError::Unavailable(reason.clone()));
        }

        if let Some(ctx) = self.live_context() {
            return Ok(ctx);
        }

        let (renderer, control) = GraphRenderer::new();
        let stream = match self.inner.backend.open(renderer) {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("Audio clock unavailable: {e}");
                *self.inner.failure.borrow_mut() = Some(e.to_string());
                return Err(e);
            }
        };

        let ctx = AudioContext::new(stream, control);
        log::info!("Audio context created at {} Hz", ctx.sample_rate());

        *self.inner.context.borrow_mut() = Some(ctx.clone());
        self.inner.gesture_armed.set(true);
        Ok(ctx)
    }

    /// The current context if one is open, without creating one.
    pub fn live_context(&self) -> Option<AudioContext> {
        self.inner
            .context
            .borrow()
            .as_ref()
            .filter(|ctx| !ctx.is_closed())
            .cloned()
    }

    /// Whether an earlier creation attempt failed
    pub fn is_unavailable(&self) -> bool {
        self.inner.failure.borrow().is_some()
    }

    /// Resume the context, creating it if needed.
    ///
    /// A resume already in progress makes this a no-op.
    pub fn resume(&self) -> ClockResult<()> {
        let ctx = self.context()?;
        let Some(_guard) = InFlight::enter(&self.inner.resuming) else {
            log::debug!("Resume already in flight");
            return Ok(());
        };
        ctx.resume()
    }

    pub fn suspend(&self) -> ClockResult<()> {
        match self.live_context() {
            Some(ctx) => ctx.suspend(),
            None => Ok(()),
        }
    }

    /// Close the current context. The next [`TransportClock::context`] call
    /// opens a fresh one.
    pub fn close(&self) {
        if let Some(ctx) = self.inner.context.borrow_mut().take() {
            ctx.close();
        }
    }

    /// Feed a host activation event. Returns whether it resumed the context.
    ///
    /// Events never create a context; they only unlock one that already
    /// exists and is suspended.
    pub fn notify(&self, event: ActivationEvent) -> bool {
        let Some(ctx) = self.live_context() else {
            return false;
        };
        if event.is_gesture() && !self.inner.gesture_armed.get() {
            return false;
        }
        if ctx.state() != ClockState::Suspended {
            return false;
        }
        let Some(_guard) = InFlight::enter(&self.inner.resuming) else {
            log::debug!("Ignoring {event:?}: resume already in flight");
            return false;
        };

        match ctx.resume() {
            Ok(()) => {
                if event.is_gesture() {
                    self.inner.gesture_armed.set(false);
                }
                log::debug!("Audio context resumed by {event:?}");
                true
            }
            Err(e) => {
                log::warn!("Failed to resume audio context on {event:?}: {e}");
                false
            }
        }
    }
}
