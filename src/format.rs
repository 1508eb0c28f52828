//! Output audio format negotiated with the engine.

use crate::{Error, Result};

/// Bits per sample of every rendered stream.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Bytes per sample of every rendered stream.
pub const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;

/// Interleaved 16-bit PCM format, fixed once the tune is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    sample_rate: u32,
    channels: u16,
}

impl AudioFormat {
    /// Create a format, rejecting a zero sample rate or channel count and
    /// any combination whose byte rate or block align overflows the WAV
    /// header fields.
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidFormat("sample rate must be positive".into()));
        }
        if channels == 0 {
            return Err(Error::InvalidFormat(
                "channel count must be positive".into(),
            ));
        }
        let block_align = channels.checked_mul(BYTES_PER_SAMPLE).ok_or_else(|| {
            Error::InvalidFormat(format!("{channels} channels overflow the block align"))
        })?;
        if sample_rate.checked_mul(u32::from(block_align)).is_none() {
            return Err(Error::InvalidFormat(format!(
                "{sample_rate} Hz with {channels} channels overflows the byte rate"
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Always 16.
    pub fn bits_per_sample(&self) -> u16 {
        BITS_PER_SAMPLE
    }

    /// Bytes per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.channels) * u32::from(BYTES_PER_SAMPLE)
    }

    /// Bytes per frame (one sample for every channel).
    pub fn block_align(&self) -> u16 {
        self.channels * BYTES_PER_SAMPLE
    }

    /// Playback length of `sample_count` interleaved samples.
    pub fn duration_seconds(&self, sample_count: usize) -> f64 {
        (sample_count as f64 / f64::from(self.channels)) / f64::from(self.sample_rate)
    }
}
