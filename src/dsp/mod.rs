//! Low-level DSP primitives used by the graph nodes.
//!
//! Allocation-free and stateful per instance; the graph layer adds note
//! events and composition on top.

/// Percussive attack/decay envelope generator.
pub mod envelope;
/// State-variable filter with low, high and band-pass responses.
pub mod filter;
/// Sine and deterministic noise oscillators.
pub mod oscillator;

pub use envelope::EnvelopeStage;
