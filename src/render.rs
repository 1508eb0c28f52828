//! Bounded render loop
//!
//! Pulls fixed-size cycle budgets from the engine into a pre-allocated PCM
//! buffer until the requested duration is covered, the tune ends, the engine
//! stalls on silence, or the iteration cap is reached.

use std::fmt;

use log::{debug, info};

use crate::engine::{RenderChunk, SidEngine};
use crate::format::AudioFormat;
use crate::wav::MAX_DATA_LEN;
use crate::{Error, Result};

/// CPU cycles requested per render call.
pub const DEFAULT_CYCLES_PER_CALL: u32 = 20_000;

/// Iteration cap as a multiple of the nominal call count.
pub const DEFAULT_ITERATION_MULTIPLIER: usize = 8;

/// Consecutive empty chunks tolerated before the stream counts as stalled.
pub const DEFAULT_SILENCE_THRESHOLD: u32 = 8;

/// Render loop tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// CPU cycles per render call
    pub cycles_per_call: u32,
    /// Multiplier applied to the nominal call count to get the hard cap
    pub iteration_multiplier: usize,
    /// Empty chunks in a row allowed before stopping; one more stops the loop
    pub silence_threshold: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cycles_per_call: DEFAULT_CYCLES_PER_CALL,
            iteration_multiplier: DEFAULT_ITERATION_MULTIPLIER,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
        }
    }
}

impl RenderConfig {
    /// Set cycles per render call (minimum 1).
    pub fn cycles_per_call(mut self, cycles: u32) -> Self {
        self.cycles_per_call = cycles.max(1);
        self
    }

    /// Set the iteration cap multiplier (minimum 1).
    pub fn iteration_multiplier(mut self, multiplier: usize) -> Self {
        self.iteration_multiplier = multiplier.max(1);
        self
    }

    /// Set the consecutive silence threshold.
    pub fn silence_threshold(mut self, threshold: u32) -> Self {
        self.silence_threshold = threshold;
        self
    }
}

/// Quantities derived from duration, format and config before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPlan {
    /// Frames covering the requested duration (rounded down)
    pub target_frames: usize,
    /// Buffer capacity in interleaved samples, never below one frame
    pub total_samples: usize,
    /// Nominal number of render calls
    pub expected_iterations: usize,
    /// Hard cap on render calls
    pub max_iterations: usize,
}

impl RenderPlan {
    /// Derive the plan for `seconds` of audio.
    ///
    /// Durations whose samples would not fit in one WAV data chunk fail with
    /// [`Error::DurationTooLong`] before anything is allocated.
    pub fn new(seconds: f64, format: AudioFormat, config: &RenderConfig) -> Result<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(Error::InvalidDuration(seconds));
        }

        let max_frames = MAX_DATA_LEN / u64::from(format.block_align());
        let too_long = || Error::DurationTooLong {
            seconds,
            max_seconds: max_frames as f64 / f64::from(format.sample_rate()),
        };

        let frames = (f64::from(format.sample_rate()) * seconds).floor();
        if frames > max_frames as f64 {
            return Err(too_long());
        }

        let channels = usize::from(format.channels());
        let target_frames = usize::try_from(frames as u64).map_err(|_| too_long())?;
        let total_samples = target_frames
            .checked_mul(channels)
            .ok_or_else(too_long)?
            .max(channels);

        let cycles = config.cycles_per_call.max(1) as usize;
        let expected_iterations = target_frames.div_ceil(cycles).max(1);
        let max_iterations =
            expected_iterations.saturating_mul(config.iteration_multiplier.max(1));

        Ok(Self {
            target_frames,
            total_samples,
            expected_iterations,
            max_iterations,
        })
    }
}

/// Why the render loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The buffer holds the full requested duration.
    BufferFilled,
    /// The engine signalled end of stream.
    Exhausted,
    /// Too many consecutive empty chunks.
    Stalled,
    /// The iteration cap was reached first.
    IterationLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::BufferFilled => "requested duration reached",
            StopReason::Exhausted => "tune finished",
            StopReason::Stalled => "renderer stalled on silence",
            StopReason::IterationLimit => "iteration limit reached",
        })
    }
}

/// Fixed-capacity interleaved PCM buffer with a monotonic write cursor.
#[derive(Debug)]
pub struct PcmBuffer {
    samples: Vec<i16>,
    cursor: usize,
}

impl PcmBuffer {
    /// Allocate a zeroed buffer of `capacity` samples.
    ///
    /// Fails with [`Error::Allocation`] instead of aborting when the memory
    /// is not available.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut samples: Vec<i16> = Vec::new();
        samples
            .try_reserve_exact(capacity)
            .map_err(|source| Error::Allocation {
                bytes: capacity.saturating_mul(std::mem::size_of::<i16>()),
                source,
            })?;
        samples.resize(capacity, 0);
        Ok(Self { samples, cursor: 0 })
    }

    /// Total capacity in samples.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Samples written so far.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Free space in samples.
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }

    /// True when the cursor reached capacity.
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Copy as much of `chunk` as fits and return the number of samples taken.
    ///
    /// Anything past the remaining capacity is dropped.
    pub fn push(&mut self, chunk: &[i16]) -> usize {
        let count = chunk.len().min(self.remaining());
        self.samples[self.cursor..self.cursor + count].copy_from_slice(&chunk[..count]);
        self.cursor += count;
        count
    }

    /// Written samples.
    pub fn as_slice(&self) -> &[i16] {
        &self.samples[..self.cursor]
    }

    /// Give up the buffer, truncated to the written length.
    pub fn into_samples(mut self) -> Vec<i16> {
        self.samples.truncate(self.cursor);
        self.samples
    }
}

/// Audio produced by one render run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAudio {
    samples: Vec<i16>,
    format: AudioFormat,
    stop_reason: StopReason,
    iterations: usize,
}

impl RenderedAudio {
    /// Interleaved samples actually rendered.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Format of the samples.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Why rendering ended.
    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    /// Render calls issued.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Length of the rendered audio in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.format.duration_seconds(self.samples.len())
    }
}

/// Render `seconds` of audio from an already loaded engine.
///
/// Fails with [`Error::NoAudio`] when not a single sample was produced.
pub fn render<E: SidEngine + ?Sized>(
    engine: &mut E,
    format: AudioFormat,
    seconds: f64,
    config: &RenderConfig,
) -> Result<RenderedAudio> {
    let plan = RenderPlan::new(seconds, format, config)?;
    debug!(
        "Render plan: {} frames, {} samples, up to {} calls of {} cycles",
        plan.target_frames, plan.total_samples, plan.max_iterations, config.cycles_per_call
    );

    let mut buffer = PcmBuffer::with_capacity(plan.total_samples)?;
    let mut silent_iterations = 0u32;
    let mut iterations = 0usize;
    let mut stop_reason = StopReason::IterationLimit;

    while iterations < plan.max_iterations {
        if buffer.is_full() {
            stop_reason = StopReason::BufferFilled;
            break;
        }
        iterations += 1;

        match engine.render(config.cycles_per_call) {
            RenderChunk::Exhausted => {
                info!("Render returned exhausted (tune finished)");
                stop_reason = StopReason::Exhausted;
                break;
            }
            RenderChunk::Data(samples) if !samples.is_empty() => {
                silent_iterations = 0;
                let copied = buffer.push(samples);
                debug!(
                    "Chunk {}: {} samples, kept {}",
                    iterations,
                    samples.len(),
                    copied
                );
            }
            RenderChunk::Data(_) | RenderChunk::Empty => {
                silent_iterations += 1;
                if silent_iterations > config.silence_threshold {
                    info!("Renderer produced repeated silence; stopping early.");
                    stop_reason = StopReason::Stalled;
                    break;
                }
            }
        }
    }

    if stop_reason == StopReason::IterationLimit && buffer.is_full() {
        stop_reason = StopReason::BufferFilled;
    }

    if buffer.is_empty() {
        return Err(Error::NoAudio);
    }

    Ok(RenderedAudio {
        samples: buffer.into_samples(),
        format,
        stop_reason,
        iterations,
    })
}
