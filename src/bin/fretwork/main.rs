//! fretwork - play a six-string fretboard from the terminal
//!
//! Run with: cargo run -- [--verbose] [path/to/pluck.wav]
//!
//! Without a path a plucked string is synthesized in place of a recording.
//! Logs go to `fretwork.log` in the system temp directory.

mod app;
mod ui;

use std::{fs::File, path::PathBuf};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use app::Fretwork;

struct Args {
    verbose: bool,
    sample: Option<PathBuf>,
}

impl Args {
    fn parse(args: impl Iterator<Item = String>) -> EyreResult<Self> {
        let mut parsed = Self {
            verbose: false,
            sample: None,
        };
        for arg in args {
            match arg.as_str() {
                "-v" | "--verbose" => parsed.verbose = true,
                flag if flag.starts_with('-') => return Err(eyre!("unknown flag {}", flag)),
                path if parsed.sample.is_none() => parsed.sample = Some(PathBuf::from(path)),
                extra => return Err(eyre!("unexpected argument {}", extra)),
            }
        }
        Ok(parsed)
    }
}

fn init_logging(verbose: bool) -> EyreResult<PathBuf> {
    let path = std::env::temp_dir().join("fretwork.log");
    let file = File::create(&path).wrap_err_with(|| format!("failed to create {:?}", path))?;
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new().add_filter_allow_str("fretwork").build();

    WriteLogger::init(level, config, file).wrap_err("failed to install logger")?;
    Ok(path)
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let args = Args::parse(std::env::args().skip(1))?;
    let log_path = init_logging(args.verbose)?;
    log::info!(target: "fretwork::app", "logging to {:?}", log_path);

    Fretwork::new(args.sample).run()
}
