//! WAV container encoding
//!
//! Produces the canonical 44-byte RIFF/WAVE header (plain PCM `fmt ` chunk,
//! no extensible format, no metadata chunks) followed by the interleaved
//! little-endian 16-bit samples.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::format::{AudioFormat, BITS_PER_SAMPLE, BYTES_PER_SAMPLE};
use crate::{Error, Result};

/// Size of the header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_TAG_PCM: u16 = 1;

/// Bytes of header counted by the RIFF chunk size.
const RIFF_OVERHEAD: u64 = WAV_HEADER_LEN as u64 - 8;

/// Largest data chunk whose RIFF size still fits in 32 bits.
pub const MAX_DATA_LEN: u64 = u32::MAX as u64 - RIFF_OVERHEAD;

/// RIFF and data chunk sizes for a payload of `data_len` bytes.
///
/// Fails with [`Error::OutputTooLarge`] past [`MAX_DATA_LEN`].
pub fn chunk_sizes(data_len: u64) -> Result<(u32, u32)> {
    let riff_len = data_len
        .checked_add(RIFF_OVERHEAD)
        .and_then(|len| u32::try_from(len).ok())
        .ok_or(Error::OutputTooLarge(data_len))?;
    let data_len = u32::try_from(data_len).map_err(|_| Error::OutputTooLarge(data_len))?;
    Ok((riff_len, data_len))
}

/// Encode interleaved samples as a complete WAV file image.
///
/// # Examples
///
/// ```
/// use sid2wav::format::AudioFormat;
/// use sid2wav::wav::{encode_wav, WAV_HEADER_LEN};
///
/// let format = AudioFormat::new(44_100, 2).unwrap();
/// let bytes = encode_wav(&[0, 0, 100, -100], format).unwrap();
/// assert_eq!(bytes.len(), WAV_HEADER_LEN + 8);
/// assert_eq!(&bytes[0..4], b"RIFF");
/// ```
pub fn encode_wav(samples: &[i16], format: AudioFormat) -> Result<Vec<u8>> {
    let data_len = samples.len() * usize::from(BYTES_PER_SAMPLE);
    let (riff_len, data_chunk_len) = chunk_sizes(data_len as u64)?;

    let total = WAV_HEADER_LEN + data_len;
    let mut out: Vec<u8> = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|source| Error::Allocation {
            bytes: total,
            source,
        })?;

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_len.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    out.extend_from_slice(&FORMAT_TAG_PCM.to_le_bytes());
    out.extend_from_slice(&format.channels().to_le_bytes());
    out.extend_from_slice(&format.sample_rate().to_le_bytes());
    out.extend_from_slice(&format.byte_rate().to_le_bytes());
    out.extend_from_slice(&format.block_align().to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_chunk_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    Ok(out)
}

/// Write `bytes` to `path` in one step.
///
/// The data goes to a temporary file next to the destination and is renamed
/// into place only after it has been flushed, so a failed write never leaves
/// a truncated file at `path`.
pub fn write_wav_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    file.write_all(bytes).map_err(|e| Error::io(file.path(), e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| Error::io(file.path(), e))?;
    file.persist(path).map_err(|e| Error::io(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test]
    fn test_header_layout_stereo() {
        let format = AudioFormat::new(44_100, 2).unwrap();
        let bytes = encode_wav(&[1, -1, 2, -2, 3, -3], format).unwrap();

        assert_eq!(bytes.len(), 44 + 12);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 36 + 12);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 1);
        assert_eq!(u16_at(&bytes, 22), 2);
        assert_eq!(u32_at(&bytes, 24), 44_100);
        assert_eq!(u32_at(&bytes, 28), 176_400);
        assert_eq!(u16_at(&bytes, 32), 4);
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 12);
    }

    #[test]
    fn test_payload_is_little_endian() {
        let format = AudioFormat::new(8_000, 1).unwrap();
        let bytes = encode_wav(&[0x1234, -2], format).unwrap();
        assert_eq!(&bytes[44..], &[0x34, 0x12, 0xFE, 0xFF]);
    }

    #[test]
    fn test_empty_payload() {
        let format = AudioFormat::new(22_050, 1).unwrap();
        let bytes = encode_wav(&[], format).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_LEN);
        assert_eq!(u32_at(&bytes, 4), 36);
        assert_eq!(u32_at(&bytes, 40), 0);
    }

    #[test]
    fn test_many_channels_keep_plain_pcm_header() {
        let format = AudioFormat::new(48_000, 6).unwrap();
        let bytes = encode_wav(&[0; 12], format).unwrap();
        assert_eq!(bytes.len(), 44 + 24);
        assert_eq!(u16_at(&bytes, 22), 6);
        assert_eq!(u32_at(&bytes, 28), 48_000 * 6 * 2);
        assert_eq!(u16_at(&bytes, 32), 12);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let format = AudioFormat::new(44_100, 2).unwrap();
        let samples: Vec<i16> = (0..1000).map(|i| (i * 37 % 65_536 - 32_768) as i16).collect();
        assert_eq!(
            encode_wav(&samples, format).unwrap(),
            encode_wav(&samples, format).unwrap()
        );
    }

    #[test]
    fn test_chunk_sizes_stop_at_32_bit_limit() {
        assert_eq!(chunk_sizes(0).unwrap(), (36, 0));
        assert_eq!(
            chunk_sizes(MAX_DATA_LEN).unwrap(),
            (u32::MAX, u32::MAX - 36)
        );
        assert!(matches!(
            chunk_sizes(MAX_DATA_LEN + 1),
            Err(Error::OutputTooLarge(_))
        ));
        // 30000 s of 44.1 kHz stereo
        assert!(matches!(
            chunk_sizes(30_000 * 176_400),
            Err(Error::OutputTooLarge(5_292_000_000))
        ));
    }

    #[test]
    fn test_write_wav_file_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        std::fs::write(&path, b"stale").unwrap();

        let format = AudioFormat::new(44_100, 2).unwrap();
        let bytes = encode_wav(&[5, 6], format).unwrap();
        write_wav_file(&path, &bytes).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), bytes);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_wav_file_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.wav");
        let result = write_wav_file(&path, b"RIFF");
        assert!(matches!(result, Err(Error::Io { .. })));
        assert!(!path.exists());
    }
}
