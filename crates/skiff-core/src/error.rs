//! Error types for the audio core

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the playback engine and its control boundary
///
/// A failed engine call is reported and the call site returns early; local
/// bookkeeping (slot flags, pitch counters) is never rolled back. Nothing
/// here is fatal to the process.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An engine control call could not be issued
    #[error("engine call failed ({operation}): {reason}")]
    CallFailed {
        operation: &'static str,
        reason: String,
    },

    /// No audio devices available
    #[error("no audio output devices found")]
    NoDevices,

    /// Failed to get device configuration
    #[error("failed to get device config: {0}")]
    ConfigError(String),

    /// Device offers a format we cannot render into
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// Failed to build the output stream
    #[error("failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start the output stream
    #[error("failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// Failed to open or decode an audio file
    #[error("failed to decode {path:?}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },

    /// A music stream is already loaded this session
    #[error("a music stream is already loaded")]
    AlreadyLoaded,

    /// Operation requires a loaded music stream
    #[error("no music stream is loaded")]
    NotLoaded,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
