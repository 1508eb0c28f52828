//! Command-line argument parsing for the sid2wav CLI.
//!
//! Tune, output and duration are positional; ROM locations and engine
//! settings are long flags accepting both `--flag value` and `--flag=value`.

use std::path::PathBuf;

use clap::Parser;
use sid2wav::driver::{DEFAULT_OUTPUT_PATH, DEFAULT_SAMPLE_RATE, MAX_SAMPLE_RATE};
use sid2wav::{RenderConfig, RenderJob, RomPaths};

/// Parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "sid2wav")]
#[command(version, about = "Render a SID tune to a 16-bit PCM WAV file")]
pub struct CliArgs {
    /// SID tune to render
    pub sid_path: PathBuf,

    /// Output WAV file
    #[arg(default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: PathBuf,

    /// Duration to render, in seconds
    #[arg(default_value = "60", value_parser = parse_seconds, allow_negative_numbers = true)]
    pub seconds: f64,

    /// Directory holding kernal.bin, basic.bin and chargen.bin
    #[arg(long, value_name = "DIR")]
    pub rom_dir: Option<PathBuf>,

    /// KERNAL ROM image (overrides --rom-dir)
    #[arg(long, value_name = "FILE")]
    pub rom_kernal: Option<PathBuf>,

    /// BASIC ROM image (overrides --rom-dir)
    #[arg(long, value_name = "FILE")]
    pub rom_basic: Option<PathBuf>,

    /// Character generator ROM image (overrides --rom-dir)
    #[arg(long, value_name = "FILE")]
    pub rom_chargen: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(long, value_name = "HZ", default_value_t = DEFAULT_SAMPLE_RATE,
          value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SAMPLE_RATE)))]
    pub sample_rate: u32,

    /// Render a single channel instead of stereo
    #[arg(long)]
    pub mono: bool,

    /// Subtune to render (defaults to the tune's start song)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub song: Option<u32>,

    /// Print the tune metadata as JSON on stdout
    #[arg(long)]
    pub info_json: bool,
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err("Duration must be a positive number of seconds".to_string());
    }
    Ok(seconds)
}

impl CliArgs {
    /// Build the render job described by these arguments.
    pub fn into_job(self) -> RenderJob {
        RenderJob {
            tune_path: self.sid_path,
            output_path: self.output_path,
            seconds: self.seconds,
            sample_rate: self.sample_rate,
            stereo: !self.mono,
            song: self.song,
            roms: RomPaths {
                dir: self.rom_dir,
                kernal: self.rom_kernal,
                basic: self.rom_basic,
                chargen: self.rom_chargen,
            },
            render: RenderConfig::default(),
        }
    }
}
