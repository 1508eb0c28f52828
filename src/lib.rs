//! SID to WAV renderer
//!
//! Drives an external SID playback engine (cycle-accurate 6502/SID emulation)
//! through a narrow interface, pulls rendered PCM back in bounded chunks and
//! stores it as an uncompressed 16-bit WAV file.
//!
//! # Pipeline
//! - [`rom`]: resolve optional KERNAL/BASIC/CHARGEN images, concurrently
//! - [`engine`]: the [`SidEngine`] boundary and its three-way [`RenderChunk`]
//! - [`render`]: bounded render loop with stall detection and an iteration cap
//! - [`wav`]: byte-exact 44-byte header WAV encoder and atomic file write
//! - [`driver`]: sequencing of all stages for one tune
//!
//! # Crate feature flags
//! - `libsidplayfp` (opt-in): compile the bundled C++ shim, link libsidplayfp
//!   and expose `engine::ffi::LibSidplayfp`
//!
//! # Quick start
//! ```no_run
//! # #[cfg(feature = "libsidplayfp")]
//! # {
//! use sid2wav::driver::{run, RenderJob};
//! use sid2wav::engine::ffi::LibSidplayfp;
//!
//! let mut engine = LibSidplayfp::new().unwrap();
//! let mut job = RenderJob::new("Team_Patrol.sid");
//! job.seconds = 30.0;
//! let report = run(&mut engine, &job).unwrap();
//! println!("{} samples written", report.samples_written);
//! # }
//! ```

#![warn(missing_docs)]

pub mod driver;
pub mod engine;
mod error;
pub mod format;
pub mod render;
pub mod rom;
pub mod wav;

pub use driver::{run, run_with, RenderJob, RenderReport};
pub use engine::{EngineError, EngineOp, RenderChunk, SidEngine, TuneInfo};
pub use error::{Error, Result};
pub use format::AudioFormat;
pub use render::{RenderConfig, RenderedAudio, StopReason};
pub use rom::{RomKind, RomPaths, RomSet};
