//! Render pipeline sequencing
//!
//! configure → system ROMs → load tune → (select song) → render → encode →
//! persist. Any failure aborts the remaining stages; the output file is
//! written once, after rendering succeeded.

use std::fs;
use std::path::PathBuf;

use log::{debug, info};

use crate::engine::{SidEngine, TuneInfo};
use crate::format::AudioFormat;
use crate::render::{self, RenderConfig, StopReason};
use crate::rom::{self, RomPaths};
use crate::wav;
use crate::{Error, Result};

/// Output file name used when none is given.
pub const DEFAULT_OUTPUT_PATH: &str = "Team_Patrol.wav";

/// Render duration used when none is given.
pub const DEFAULT_SECONDS: f64 = 60.0;

/// Sample rate requested from the engine when none is given.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Highest sample rate the CLI accepts.
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Everything needed for one tune-to-WAV run.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Tune file to render
    pub tune_path: PathBuf,
    /// Destination WAV file
    pub output_path: PathBuf,
    /// Requested length in seconds
    pub seconds: f64,
    /// Requested output sample rate
    pub sample_rate: u32,
    /// Stereo (true) or mono output
    pub stereo: bool,
    /// Subtune to play; `None` keeps the tune's start song
    pub song: Option<u32>,
    /// Custom system ROM sources
    pub roms: RomPaths,
    /// Render loop tuning
    pub render: RenderConfig,
}

impl RenderJob {
    /// Job with default output, duration and engine settings.
    pub fn new(tune_path: impl Into<PathBuf>) -> Self {
        Self {
            tune_path: tune_path.into(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            seconds: DEFAULT_SECONDS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            stereo: true,
            song: None,
            roms: RomPaths::default(),
            render: RenderConfig::default(),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// File that was written
    pub output_path: PathBuf,
    /// Format of the written audio
    pub format: AudioFormat,
    /// Interleaved samples written
    pub samples_written: usize,
    /// Length of the written audio
    pub seconds_written: f64,
    /// Why rendering ended
    pub stop_reason: StopReason,
    /// Render calls issued
    pub iterations: usize,
    /// Whether a custom ROM set was applied
    pub custom_roms: bool,
    /// Tune metadata reported after loading
    pub tune_info: Option<TuneInfo>,
    /// First samples of the rendered stream
    pub preview: Vec<i16>,
}

/// Number of leading samples kept in [`RenderReport::preview`].
pub const PREVIEW_SAMPLES: usize = 16;

/// Run the whole pipeline against `engine`.
pub fn run<E: SidEngine + ?Sized>(engine: &mut E, job: &RenderJob) -> Result<RenderReport> {
    run_with(engine, job, |_| {})
}

/// Like [`run`], calling `on_loaded` with the tune metadata as soon as the
/// tune is loaded, before rendering starts.
///
/// The callback fires even when a later stage fails.
pub fn run_with<E, F>(engine: &mut E, job: &RenderJob, on_loaded: F) -> Result<RenderReport>
where
    E: SidEngine + ?Sized,
    F: FnOnce(&TuneInfo),
{
    if !job.seconds.is_finite() || job.seconds <= 0.0 {
        return Err(Error::InvalidDuration(job.seconds));
    }

    let tune = fs::read(&job.tune_path).map_err(|e| Error::io(&job.tune_path, e))?;
    debug!("Read {} bytes from {}", tune.len(), job.tune_path.display());

    engine
        .configure(job.sample_rate, job.stereo)
        .map_err(Error::Configure)?;

    let custom_roms = match rom::resolve_roms(&job.roms) {
        Some(roms) => {
            engine.set_system_roms(&roms).map_err(Error::RomApply)?;
            info!("Custom system ROMs applied.");
            true
        }
        None => false,
    };

    engine.load_tune(&tune).map_err(Error::TuneLoad)?;

    if let Some(song) = job.song {
        let selected = engine
            .select_song(song)
            .map_err(|source| Error::SongSelect { song, source })?;
        info!("Selected song {}", selected);
    }

    let tune_info = engine.tune_info();
    if let Some(info) = &tune_info {
        info!("Tune Info: {}", info);
        on_loaded(info);
    }

    let format = AudioFormat::new(engine.sample_rate(), engine.channels())?;
    info!("Loaded SID from {}", job.tune_path.display());
    info!(
        "Rendering {} seconds at {} Hz ({} channels)",
        job.seconds,
        format.sample_rate(),
        format.channels()
    );

    let audio = render::render(engine, format, job.seconds, &job.render)?;
    debug!(
        "Render stopped after {} calls: {}",
        audio.iterations(),
        audio.stop_reason()
    );

    let bytes = wav::encode_wav(audio.samples(), format)?;
    wav::write_wav_file(&job.output_path, &bytes)?;

    let seconds_written = audio.duration_seconds();
    info!(
        "Wrote {} ({:.2} seconds)",
        job.output_path.display(),
        seconds_written
    );

    let preview: Vec<i16> = audio.samples().iter().take(PREVIEW_SAMPLES).copied().collect();
    debug!("First {} samples: {:?}", preview.len(), preview);

    Ok(RenderReport {
        output_path: job.output_path.clone(),
        format,
        samples_written: audio.samples().len(),
        seconds_written,
        stop_reason: audio.stop_reason(),
        iterations: audio.iterations(),
        custom_roms,
        tune_info,
        preview,
    })
}
