//! Engine boundary abstraction
//!
//! The 6502/SID emulation lives in an external engine (libsidplayfp). This module
//! defines the narrow interface the driver needs from it. Every fallible call
//! returns a [`Result`] carrying the engine's own diagnostic, captured at the
//! moment of failure.

#[cfg(feature = "libsidplayfp")]
pub mod ffi;

use std::fmt;

use serde::Serialize;

use crate::rom::RomSet;

/// Engine operation that produced an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOp {
    /// `configure(sample_rate, stereo)`
    Configure,
    /// `set_system_roms(kernal, basic, chargen)`
    SetSystemRoms,
    /// `load_tune(bytes)`
    LoadTune,
    /// `select_song(song)`
    SelectSong,
    /// `render(cycles)`
    Render,
}

impl EngineOp {
    /// Short name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineOp::Configure => "configure",
            EngineOp::SetSystemRoms => "setSystemROMs",
            EngineOp::LoadTune => "loadSidBuffer",
            EngineOp::SelectSong => "selectSong",
            EngineOp::Render => "render",
        }
    }
}

impl fmt::Display for EngineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by the engine, with its last-error string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    op: EngineOp,
    message: String,
}

impl EngineError {
    /// Create an error for `op` with the engine's diagnostic.
    pub fn new(op: EngineOp, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            format!("{op} failed without a diagnostic")
        } else {
            message
        };
        Self { op, message }
    }

    /// Operation that failed.
    pub fn op(&self) -> EngineOp {
        self.op
    }

    /// Engine diagnostic.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of one render call.
///
/// `Data` borrows engine-owned memory that the next call invalidates, so the
/// borrow has to end before the engine is asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderChunk<'a> {
    /// Interleaved samples produced for the requested cycles.
    Data(&'a [i16]),
    /// The engine ran but produced no samples.
    Empty,
    /// The stream is over (end of tune or unrecoverable engine state).
    Exhausted,
}

impl RenderChunk<'_> {
    /// Samples carried by this chunk, empty for `Empty` and `Exhausted`.
    pub fn samples(&self) -> &[i16] {
        match self {
            RenderChunk::Data(samples) => samples,
            RenderChunk::Empty | RenderChunk::Exhausted => &[],
        }
    }
}

/// Metadata of the loaded tune as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TuneInfo {
    /// Number of subtunes
    pub songs: u32,
    /// Default subtune (1-based)
    pub start_song: u32,
    /// Currently selected subtune (1-based)
    pub current_song: u32,
    /// C64 load address
    pub load_address: u16,
    /// Init routine address
    pub init_address: u16,
    /// Play routine address
    pub play_address: u16,
    /// Size of the tune file in bytes
    pub data_file_len: u32,
    /// Size of the C64 payload in bytes
    pub c64_data_len: u32,
    /// Clock speed code (unknown, PAL, NTSC, any)
    pub clock_speed: i32,
    /// Container format description, e.g. "PlaySID one-file format (PSID)"
    pub format: String,
    /// Title, author, released
    pub info_strings: Vec<String>,
    /// Free-form comments (MUS files)
    pub comment_strings: Vec<String>,
}

impl TuneInfo {
    /// Title line, when the tune carries one.
    pub fn title(&self) -> Option<&str> {
        self.info_strings.first().map(String::as_str)
    }

    /// Author line, when the tune carries one.
    pub fn author(&self) -> Option<&str> {
        self.info_strings.get(1).map(String::as_str)
    }
}

impl fmt::Display for TuneInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} [{}] song {}/{}",
            self.title().unwrap_or("<untitled>"),
            self.author().unwrap_or("<unknown>"),
            self.format,
            self.current_song,
            self.songs
        )
    }
}

/// Interface to a SID playback engine.
///
/// Calls are synchronous and must be issued in sequence: the engine keeps
/// emulation state that advances with every `render`.
///
/// # Example
///
/// ```ignore
/// use sid2wav::engine::{RenderChunk, SidEngine};
///
/// fn first_chunk_len<E: SidEngine>(engine: &mut E, tune: &[u8]) -> usize {
///     engine.configure(44_100, true).unwrap();
///     engine.load_tune(tune).unwrap();
///     match engine.render(20_000) {
///         RenderChunk::Data(samples) => samples.len(),
///         RenderChunk::Empty | RenderChunk::Exhausted => 0,
///     }
/// }
/// ```
pub trait SidEngine {
    /// Set output sample rate and channel layout.
    fn configure(&mut self, sample_rate: u32, stereo: bool) -> Result<(), EngineError>;

    /// Install the complete ROM triple in one step.
    ///
    /// Absent entries clear any previously installed image of that kind. On
    /// failure the engine keeps its prior ROM state.
    fn set_system_roms(&mut self, roms: &RomSet) -> Result<(), EngineError>;

    /// Load a tune from memory and prepare its start song.
    fn load_tune(&mut self, data: &[u8]) -> Result<(), EngineError>;

    /// Switch to subtune `song` (1-based, 0 selects the start song).
    ///
    /// Returns the subtune actually selected.
    fn select_song(&mut self, song: u32) -> Result<u32, EngineError>;

    /// Emulate `cycles` CPU cycles and return the audio they produced.
    fn render(&mut self, cycles: u32) -> RenderChunk<'_>;

    /// Output channel count (1 or 2).
    fn channels(&self) -> u16;

    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Metadata of the loaded tune, if any.
    fn tune_info(&self) -> Option<TuneInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_keeps_message() {
        let err = EngineError::new(
            EngineOp::LoadTune,
            "SIDTUNE ERROR: Could not determine file format",
        );
        assert_eq!(err.op(), EngineOp::LoadTune);
        assert_eq!(
            err.to_string(),
            "SIDTUNE ERROR: Could not determine file format"
        );
    }

    #[test]
    fn test_engine_error_without_diagnostic_names_operation() {
        let err = EngineError::new(EngineOp::SetSystemRoms, "");
        assert_eq!(err.message(), "setSystemROMs failed without a diagnostic");
    }

    #[test]
    fn test_chunk_samples() {
        let data = [1i16, -1, 2, -2];
        assert_eq!(RenderChunk::Data(&data).samples(), &data);
        assert!(RenderChunk::Empty.samples().is_empty());
        assert!(RenderChunk::Exhausted.samples().is_empty());
    }

    #[test]
    fn test_tune_info_display() {
        let info = TuneInfo {
            songs: 3,
            start_song: 1,
            current_song: 2,
            format: "PlaySID one-file format (PSID)".into(),
            info_strings: vec!["Team Patrol".into(), "Some Composer".into(), "1988".into()],
            ..TuneInfo::default()
        };
        assert_eq!(
            info.to_string(),
            "Team Patrol by Some Composer [PlaySID one-file format (PSID)] song 2/3"
        );
    }
}
