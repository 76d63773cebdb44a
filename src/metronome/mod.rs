//! Click-track metronome synchronized to an external player.
//!
//! ```text
//!   generate_track(duration, bpm)        enable(true, t) / seek(t)
//!            │                                     │
//!            ▼                                     ▼
//!   ClickSet ──► render_track ──► MetronomeTrack ──► AudioContext::start_source
//!   (per style)   (offline)        (Arc, immutable)   (from offset t, live gain)
//! ```
//!
//! The track is rendered once, faster than real time, and only ever played
//! from an offset; nothing is scheduled click by click.

mod config;
mod engine;
mod time_signature;
mod track;

pub use config::{AccentPolicy, MetronomeConfig};
pub use engine::{EngineState, MetronomeEngine, PlaybackState};
pub use time_signature::{InvalidTimeSignature, TimeSignature};
pub use track::{render_track, MetronomeTrack, TrackParams};
