//! System ROM resolution
//!
//! Each of the three C64 system ROMs (KERNAL, BASIC, character generator) can
//! be given explicitly or picked up from a ROM directory under its
//! conventional file name. Lookups are independent: a missing or unreadable
//! file only drops that one image, with a warning.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use log::{info, warn};

/// Kind of C64 system ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomKind {
    /// KERNAL operating system ROM
    Kernal,
    /// BASIC interpreter ROM
    Basic,
    /// Character generator ROM
    Chargen,
}

impl RomKind {
    /// All kinds, in engine argument order.
    pub const ALL: [RomKind; 3] = [RomKind::Kernal, RomKind::Basic, RomKind::Chargen];

    /// File name looked up inside a ROM directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            RomKind::Kernal => "kernal.bin",
            RomKind::Basic => "basic.bin",
            RomKind::Chargen => "chargen.bin",
        }
    }

    /// Image size the engine accepts for this kind.
    pub fn expected_len(&self) -> usize {
        match self {
            RomKind::Kernal | RomKind::Basic => 8192,
            RomKind::Chargen => 4096,
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RomKind::Kernal => "KERNAL ROM",
            RomKind::Basic => "BASIC ROM",
            RomKind::Chargen => "CHARGEN ROM",
        }
    }
}

impl fmt::Display for RomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where to look for custom system ROMs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomPaths {
    /// Fallback directory holding `kernal.bin`, `basic.bin`, `chargen.bin`
    pub dir: Option<PathBuf>,
    /// Explicit KERNAL image
    pub kernal: Option<PathBuf>,
    /// Explicit BASIC image
    pub basic: Option<PathBuf>,
    /// Explicit character generator image
    pub chargen: Option<PathBuf>,
}

impl RomPaths {
    /// Explicit path configured for `kind`.
    pub fn explicit(&self, kind: RomKind) -> Option<&Path> {
        match kind {
            RomKind::Kernal => self.kernal.as_deref(),
            RomKind::Basic => self.basic.as_deref(),
            RomKind::Chargen => self.chargen.as_deref(),
        }
    }

    /// File to read for `kind`: the explicit path, else the directory
    /// convention, else nothing.
    pub fn source(&self, kind: RomKind) -> Option<PathBuf> {
        match self.explicit(kind) {
            Some(path) => Some(path.to_path_buf()),
            None => self.dir.as_ref().map(|dir| dir.join(kind.file_name())),
        }
    }

    /// True when no ROM source is configured at all.
    pub fn is_unset(&self) -> bool {
        RomKind::ALL.iter().all(|&kind| self.source(kind).is_none())
    }
}

/// ROM images handed to the engine in a single call.
///
/// An absent entry tells the engine to use (or fall back to) its built-in
/// replacement for that kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomSet {
    /// KERNAL image
    pub kernal: Option<Vec<u8>>,
    /// BASIC image
    pub basic: Option<Vec<u8>>,
    /// Character generator image
    pub chargen: Option<Vec<u8>>,
}

impl RomSet {
    /// Image of `kind`, if present.
    pub fn get(&self, kind: RomKind) -> Option<&[u8]> {
        match kind {
            RomKind::Kernal => self.kernal.as_deref(),
            RomKind::Basic => self.basic.as_deref(),
            RomKind::Chargen => self.chargen.as_deref(),
        }
    }

    /// Store the image of `kind`.
    pub fn set(&mut self, kind: RomKind, image: Option<Vec<u8>>) {
        match kind {
            RomKind::Kernal => self.kernal = image,
            RomKind::Basic => self.basic = image,
            RomKind::Chargen => self.chargen = image,
        }
    }

    /// True when no image is present.
    pub fn is_empty(&self) -> bool {
        RomKind::ALL.iter().all(|&kind| self.get(kind).is_none())
    }

    /// Kinds with an image present.
    pub fn present(&self) -> impl Iterator<Item = RomKind> + '_ {
        RomKind::ALL
            .into_iter()
            .filter(move |&kind| self.get(kind).is_some())
    }
}

/// Read one ROM image, degrading any failure to `None`.
pub fn load_rom(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => {
            info!("Loaded ROM {} ({} bytes)", path.display(), bytes.len());
            Some(bytes)
        }
        Err(err) => {
            warn!("Unable to load ROM from {}: {}", path.display(), err);
            None
        }
    }
}

/// Resolve all three ROM kinds concurrently.
///
/// Returns `None` when nothing resolved, meaning no custom ROMs should be
/// applied. Otherwise the returned set holds every image that loaded, with the
/// others explicitly absent.
pub fn resolve_roms(paths: &RomPaths) -> Option<RomSet> {
    if paths.is_unset() {
        return None;
    }

    let images = thread::scope(|scope| {
        let handles = RomKind::ALL.map(|kind| {
            let source = paths.source(kind);
            scope.spawn(move || source.and_then(|path| load_rom(&path)))
        });
        handles.map(|handle| handle.join().unwrap_or(None))
    });

    let mut set = RomSet::default();
    for (kind, image) in RomKind::ALL.into_iter().zip(images) {
        set.set(kind, image);
    }

    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}
