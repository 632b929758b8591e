#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays the siege controller over the engine's
//! stdin/stdout line protocol.

mod driver;
mod protocol;

use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use siege_system_controller::{TurnController, Tuning};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::driver::{Driver, Reply};

/// Plays one match against the game engine.
#[derive(Debug, Parser)]
#[command(name = "siege", version, about = "Turn controller for the siege arena")]
struct Cli {
    /// TOML file overriding the controller thresholds.
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `siege_system_controller=trace`.
    /// Falls back to `RUST_LOG`, then `info`.
    #[arg(long)]
    log_level: Option<String>,
}

/// Entry point for the siege command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let tuning = load_tuning(cli.tuning.as_deref())?;
    let mut driver = Driver::new(TurnController::new(tuning));

    let stdin = io::stdin();
    let stdout = io::stdout();
    play(&mut driver, stdin.lock(), stdout.lock())
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log level '{directive}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    // stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow!(error))
}

fn load_tuning(path: Option<&Path>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse tuning file {}", path.display()))
}

fn play<R, W>(driver: &mut Driver, input: R, mut output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line.context("failed to read from the engine")?;
        if line.trim().is_empty() {
            continue;
        }

        match driver.handle_line(&line) {
            Ok(Reply::Idle) => {}
            Ok(Reply::Submit { build, deploy }) => {
                writeln!(output, "{build}")?;
                writeln!(output, "{deploy}")?;
                output.flush().context("failed to submit the turn")?;
            }
            Ok(Reply::Finished) => break,
            Err(error) if driver.is_configured() => {
                warn!(%error, "skipping malformed frame");
            }
            Err(error) => return Err(error).context("failed to read the game configuration"),
        }
    }
    Ok(())
}
