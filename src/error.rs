//! Error types for the clock, offline renderer and asset loader.
//!
//! None of these reach the UI: the metronome engine logs them and degrades to
//! a no-op, the aligner never fails at all.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the transport clock and its audio backends
#[derive(Error, Debug)]
pub enum ClockError {
    /// The backend cannot provide an audio clock in this environment
    #[error("audio clock unsupported: {0}")]
    Unsupported(String),

    /// No output device to drive the clock
    #[error("no audio output device available")]
    NoDevice,

    /// Failed to query the device configuration
    #[error("failed to get device config: {0}")]
    Config(String),

    /// Unsupported device sample format
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Failed to build the output stream
    #[error("failed to build audio stream: {0}")]
    StreamBuild(String),

    /// Failed to start or pause the output stream
    #[error("failed to change stream state: {0}")]
    StreamState(String),

    /// The context was closed
    #[error("audio context is closed")]
    Closed,

    /// An earlier creation attempt failed; the clock stays unusable
    #[error("audio clock unavailable: {0}")]
    Unavailable(String),

    /// The real-time command queue is full
    #[error("real-time command queue is full")]
    QueueFull,
}

/// Result type for clock operations
pub type ClockResult<T> = Result<T, ClockError>;

/// Errors raised while rendering a click track offline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("invalid tempo: {0} BPM")]
    InvalidTempo(f64),

    #[error("invalid duration: {0}s")]
    InvalidDuration(f64),

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("track of {seconds:.1}s exceeds the {limit:.1}s limit")]
    TooLong { seconds: f64, limit: f64 },

    #[error("click buffer is empty")]
    EmptyClick,
}

/// Result type for offline rendering
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while loading recorded click samples
#[derive(Error, Debug)]
pub enum AssetError {
    /// The asset could not be opened or decoded
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// The asset decoded to zero frames
    #[error("asset {0} contains no audio")]
    Empty(PathBuf),

    /// The asset has an invalid channel layout or rate
    #[error("asset {path} has unsupported format: {reason}")]
    Format { path: PathBuf, reason: String },

    /// The source has no such asset
    #[error("asset {0} is not available")]
    Missing(String),

    /// Writing a rendered buffer to disk failed
    #[error("failed to write {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

/// Result type for asset loading
pub type AssetResult<T> = Result<T, AssetError>;

/// A click style name that does not match any known style
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown click style: {0}")]
pub struct UnknownStyle(pub String);
