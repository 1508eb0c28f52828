//! Error types for SID rendering

use std::path::PathBuf;

use crate::engine::EngineError;

/// Error type for the render pipeline
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Requested duration is zero, negative, or not a finite number
    #[error("Duration must be a positive number of seconds (got {0})")]
    InvalidDuration(f64),

    /// Requested duration does not fit the 32-bit WAV size fields
    #[error(
        "Duration of {seconds} seconds is too long: at most {max_seconds:.0} seconds fit in one WAV file at this format"
    )]
    DurationTooLong {
        /// Requested duration
        seconds: f64,
        /// Longest duration the format allows
        max_seconds: f64,
    },

    /// Audio payload does not fit the 32-bit WAV size fields
    #[error("Audio data of {0} bytes exceeds the WAV size limit")]
    OutputTooLarge(u64),

    /// Audio buffer could not be allocated
    #[error("Failed to allocate {bytes} bytes of audio buffer: {source}")]
    Allocation {
        /// Requested allocation size
        bytes: usize,
        /// Allocator failure
        #[source]
        source: std::collections::TryReserveError,
    },

    /// Engine reported an unusable output format
    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    /// Engine refused the output configuration
    #[error("Failed to configure player: {0}")]
    Configure(#[source] EngineError),

    /// Engine refused the custom system ROM set
    #[error("Failed to apply ROMs: {0}")]
    RomApply(#[source] EngineError),

    /// Engine rejected the tune data
    #[error("Failed to load SID: {0}")]
    TuneLoad(#[source] EngineError),

    /// Engine could not switch to the requested subtune
    #[error("Failed to select song {song}: {source}")]
    SongSelect {
        /// Requested subtune number
        song: u32,
        /// Underlying engine failure
        #[source]
        source: EngineError,
    },

    /// Render loop finished without a single sample
    #[error("No audio data was produced by the renderer")]
    NoAudio,

    /// IO error while reading the tune or persisting the output
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File the operation was performed on
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for render pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
