//! libsidplayfp backend
//!
//! Binds the C ABI of `csrc/sidplayer_shim.cpp`, which `build.rs` compiles
//! when the feature is on: a thin wrapper around a libsidplayfp `sidplayfp`
//! player with a reSIDfp builder. The shim owns the engine state, including
//! the mix buffer handed back by `sidplayer_render`, which stays valid until
//! the next call on the same handle.
//!
//! Render result codes: `1` data, `0` no samples, negative end of stream or
//! engine failure (last error is set).

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr::{self, NonNull};
use std::slice;

use log::debug;

use super::{EngineError, EngineOp, RenderChunk, SidEngine, TuneInfo};
use crate::rom::{RomKind, RomSet};

#[repr(C)]
struct RawPlayer {
    _private: [u8; 0],
}

/// Tune metadata as laid out by the shim. String pointers are owned by the
/// engine and valid until the next tune load.
#[repr(C)]
struct RawTuneInfo {
    songs: c_uint,
    start_song: c_uint,
    current_song: c_uint,
    load_addr: u16,
    init_addr: u16,
    play_addr: u16,
    data_file_len: u32,
    c64_data_len: u32,
    clock_speed: c_int,
    format: *const c_char,
    info_count: c_uint,
    info_strings: *const *const c_char,
    comment_count: c_uint,
    comment_strings: *const *const c_char,
}

extern "C" {
    fn sidplayer_new() -> *mut RawPlayer;
    fn sidplayer_free(player: *mut RawPlayer);
    fn sidplayer_configure(player: *mut RawPlayer, frequency: u32, stereo: bool) -> bool;
    fn sidplayer_load_buffer(player: *mut RawPlayer, data: *const u8, len: usize) -> bool;
    fn sidplayer_select_song(player: *mut RawPlayer, song: c_uint) -> c_uint;
    fn sidplayer_set_roms(
        player: *mut RawPlayer,
        kernal: *const u8,
        basic: *const u8,
        chargen: *const u8,
    ) -> bool;
    fn sidplayer_render(
        player: *mut RawPlayer,
        cycles: c_uint,
        out: *mut *const i16,
        out_len: *mut usize,
    ) -> c_int;
    fn sidplayer_channels(player: *const RawPlayer) -> c_uint;
    fn sidplayer_sample_rate(player: *const RawPlayer) -> u32;
    fn sidplayer_tune_info(player: *const RawPlayer, info: *mut RawTuneInfo) -> bool;
    fn sidplayer_last_error(player: *const RawPlayer) -> *const c_char;
}

/// Owned handle to a libsidplayfp player.
pub struct LibSidplayfp {
    raw: NonNull<RawPlayer>,
}

impl LibSidplayfp {
    /// Create a player with the engine's default configuration.
    pub fn new() -> Result<Self, EngineError> {
        // SAFETY: no preconditions; a null return signals allocation failure.
        let raw = unsafe { sidplayer_new() };
        NonNull::new(raw)
            .map(|raw| Self { raw })
            .ok_or_else(|| EngineError::new(EngineOp::Configure, "SID builder not initialized"))
    }

    fn last_error(&self, op: EngineOp) -> EngineError {
        // SAFETY: handle is live; the returned string is owned by the engine
        // and copied before any further call.
        let message = unsafe {
            let ptr = sidplayer_last_error(self.raw.as_ptr());
            c_string(ptr)
        };
        EngineError::new(op, message)
    }
}

impl Drop for LibSidplayfp {
    fn drop(&mut self) {
        // SAFETY: the handle came from sidplayer_new and is freed once.
        unsafe { sidplayer_free(self.raw.as_ptr()) }
    }
}

/// Copy a possibly null C string.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Copy a possibly null array of C strings.
///
/// # Safety
///
/// `ptr` must be null or point to `count` valid string pointers.
unsafe fn c_strings(ptr: *const *const c_char, count: c_uint) -> Vec<String> {
    if ptr.is_null() {
        return Vec::new();
    }
    slice::from_raw_parts(ptr, count as usize)
        .iter()
        .map(|&s| c_string(s))
        .collect()
}

/// Out-of-range counts map to zero, which the output format rejects.
fn channel_count(raw: c_uint) -> u16 {
    u16::try_from(raw).unwrap_or(0)
}

fn check_rom(roms: &RomSet, kind: RomKind) -> Result<*const u8, EngineError> {
    match roms.get(kind) {
        None => Ok(ptr::null()),
        Some([]) => Err(EngineError::new(
            EngineOp::SetSystemRoms,
            format!("{kind} buffer length is zero"),
        )),
        Some(image) if image.len() != kind.expected_len() => Err(EngineError::new(
            EngineOp::SetSystemRoms,
            format!("{kind} buffer expected {} bytes", kind.expected_len()),
        )),
        Some(image) => Ok(image.as_ptr()),
    }
}

impl SidEngine for LibSidplayfp {
    fn configure(&mut self, sample_rate: u32, stereo: bool) -> Result<(), EngineError> {
        // SAFETY: handle is live.
        if unsafe { sidplayer_configure(self.raw.as_ptr(), sample_rate, stereo) } {
            Ok(())
        } else {
            Err(self.last_error(EngineOp::Configure))
        }
    }

    fn set_system_roms(&mut self, roms: &RomSet) -> Result<(), EngineError> {
        // Validate the whole triple before the engine sees any of it.
        let kernal = check_rom(roms, RomKind::Kernal)?;
        let basic = check_rom(roms, RomKind::Basic)?;
        let chargen = check_rom(roms, RomKind::Chargen)?;

        // SAFETY: handle is live; image pointers are null or point to buffers
        // of the size the engine expects, and the engine copies them.
        if unsafe { sidplayer_set_roms(self.raw.as_ptr(), kernal, basic, chargen) } {
            Ok(())
        } else {
            Err(self.last_error(EngineOp::SetSystemRoms))
        }
    }

    fn load_tune(&mut self, data: &[u8]) -> Result<(), EngineError> {
        if data.is_empty() {
            return Err(EngineError::new(EngineOp::LoadTune, "Buffer length is zero"));
        }
        // SAFETY: handle is live; the engine copies `data` before returning.
        if unsafe { sidplayer_load_buffer(self.raw.as_ptr(), data.as_ptr(), data.len()) } {
            Ok(())
        } else {
            Err(self.last_error(EngineOp::LoadTune))
        }
    }

    fn select_song(&mut self, song: u32) -> Result<u32, EngineError> {
        // SAFETY: handle is live.
        match unsafe { sidplayer_select_song(self.raw.as_ptr(), song) } {
            0 => Err(self.last_error(EngineOp::SelectSong)),
            selected => Ok(selected),
        }
    }

    fn render(&mut self, cycles: u32) -> RenderChunk<'_> {
        let mut data: *const i16 = ptr::null();
        let mut len = 0usize;
        // SAFETY: handle is live; out-pointers reference locals.
        let code = unsafe { sidplayer_render(self.raw.as_ptr(), cycles, &mut data, &mut len) };

        if code < 0 {
            let err = self.last_error(EngineOp::Render);
            debug!("Engine render stopped: {}", err);
            return RenderChunk::Exhausted;
        }
        if code == 0 || data.is_null() || len == 0 {
            return RenderChunk::Empty;
        }

        // SAFETY: the shim guarantees `len` samples at `data`, owned by the
        // engine until the next call on this handle, which the returned
        // borrow of `self` prevents.
        RenderChunk::Data(unsafe { slice::from_raw_parts(data, len) })
    }

    fn channels(&self) -> u16 {
        // SAFETY: handle is live.
        channel_count(unsafe { sidplayer_channels(self.raw.as_ptr()) })
    }

    fn sample_rate(&self) -> u32 {
        // SAFETY: handle is live.
        unsafe { sidplayer_sample_rate(self.raw.as_ptr()) }
    }

    fn tune_info(&self) -> Option<TuneInfo> {
        let mut raw = RawTuneInfo {
            songs: 0,
            start_song: 0,
            current_song: 0,
            load_addr: 0,
            init_addr: 0,
            play_addr: 0,
            data_file_len: 0,
            c64_data_len: 0,
            clock_speed: 0,
            format: ptr::null(),
            info_count: 0,
            info_strings: ptr::null(),
            comment_count: 0,
            comment_strings: ptr::null(),
        };

        // SAFETY: handle is live; `raw` is a valid out-parameter and the
        // strings it receives are copied before returning.
        unsafe {
            if !sidplayer_tune_info(self.raw.as_ptr(), &mut raw) {
                return None;
            }
            Some(TuneInfo {
                songs: raw.songs,
                start_song: raw.start_song,
                current_song: raw.current_song,
                load_address: raw.load_addr,
                init_address: raw.init_addr,
                play_address: raw.play_addr,
                data_file_len: raw.data_file_len,
                c64_data_len: raw.c64_data_len,
                clock_speed: raw.clock_speed,
                format: c_string(raw.format),
                info_strings: c_strings(raw.info_strings, raw.info_count),
                comment_strings: c_strings(raw.comment_strings, raw.comment_count),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::AudioFormat;

    #[test]
    fn test_shim_reports_engine_state() {
        let mut player = LibSidplayfp::new().unwrap();
        player.configure(48_000, false).unwrap();
        assert_eq!(player.sample_rate(), 48_000);
        assert_eq!(player.channels(), 1);

        // nothing loaded yet
        assert!(matches!(player.render(20_000), RenderChunk::Exhausted));
        assert!(player.tune_info().is_none());
        assert!(player.select_song(1).is_err());

        let err = player.load_tune(b"not a sid tune").unwrap_err();
        assert_eq!(err.op(), EngineOp::LoadTune);
        assert!(!err.message().is_empty());
    }

    #[test]
    fn test_channel_count_does_not_truncate() {
        assert_eq!(channel_count(2), 2);
        assert_eq!(channel_count(65_538), 0);
        assert!(AudioFormat::new(44_100, channel_count(65_538)).is_err());
    }

    #[test]
    fn test_check_rom_sizes() {
        let roms = RomSet {
            kernal: Some(vec![0; 8192]),
            basic: Some(vec![0; 100]),
            chargen: Some(Vec::new()),
        };
        assert!(!check_rom(&roms, RomKind::Kernal).unwrap().is_null());
        assert_eq!(
            check_rom(&roms, RomKind::Basic).unwrap_err().message(),
            "BASIC ROM buffer expected 8192 bytes"
        );
        assert_eq!(
            check_rom(&roms, RomKind::Chargen).unwrap_err().message(),
            "CHARGEN ROM buffer length is zero"
        );
        assert!(check_rom(&RomSet::default(), RomKind::Kernal)
            .unwrap()
            .is_null());
    }
}
