//! sid2wav - render SID chiptunes to WAV
//!
//! Loads a tune into the libsidplayfp engine, renders the requested duration
//! and writes a 16-bit PCM WAV file. Log verbosity follows `RUST_LOG`
//! (default `info`).

mod args;

use std::process::ExitCode;

use clap::Parser;

use args::CliArgs;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
}

#[cfg(not(feature = "libsidplayfp"))]
fn main() -> ExitCode {
    init_logging();
    let job = CliArgs::parse().into_job();
    eprintln!(
        "error: cannot render {}: sid2wav was built without an engine backend. \
         Rebuild with `--features libsidplayfp` to link the SID engine.",
        job.tune_path.display()
    );
    ExitCode::FAILURE
}

#[cfg(feature = "libsidplayfp")]
fn main() -> ExitCode {
    init_logging();
    let args = CliArgs::parse();

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "libsidplayfp")]
mod cli {
    use anyhow::anyhow;
    use log::{info, warn};
    use sid2wav::engine::ffi::LibSidplayfp;

    use crate::args::CliArgs;

    pub fn run(args: CliArgs) -> anyhow::Result<()> {
        let info_json = args.info_json;
        let job = args.into_job();

        let mut engine =
            LibSidplayfp::new().map_err(|e| anyhow!("Failed to create player: {e}"))?;
        let report = sid2wav::run_with(&mut engine, &job, |tune_info| {
            if !info_json {
                return;
            }
            match serde_json::to_string_pretty(tune_info) {
                Ok(json) => println!("{json}"),
                Err(err) => warn!("Unable to encode tune info as JSON: {err}"),
            }
        })?;

        info!(
            "Render stopped after {} calls ({})",
            report.iterations, report.stop_reason
        );

        Ok(())
    }
}
