//! Composable building blocks for synthesizing click sounds.
//!
//! Graph nodes wrap the low-level DSP primitives with strike events and
//! block-based rendering. The `extensions` module adds fluent helpers so click
//! styles can be authored as short chains.

/// Multiply two signals together.
pub mod amplify;
/// Percussive envelope node.
pub mod envelope;
/// Fluent combinators (`.amplify()`, `.mix()`, `.through()`).
pub mod extensions;
/// Band-pass filter node.
pub mod filter;
/// Linear wet/dry mixing for parallel graphs.
pub mod mix;
/// Core traits shared by all graph nodes.
pub mod node;
/// Sine partials and noise sources.
pub mod oscillator;
/// Serial chaining of two nodes (source -> effect).
pub mod through;

pub use node::{GraphNode, RenderCtx};
