pub mod align; // Chord-to-beat alignment
pub mod buffer;
pub mod clicks; // Click sounds per style
pub mod clock; // Shared audio clock and real-time playback
pub mod dsp;
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod metronome;

pub use align::{align, ChordBeatAligner};
pub use clock::TransportClock;
pub use metronome::MetronomeEngine;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
