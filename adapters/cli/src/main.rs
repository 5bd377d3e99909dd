#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host that runs a Gridfort simulation headlessly.

mod opening;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use gridfort_engine::{Engine, GameSnapshot, SimConfig};

/// Runs a headless Gridfort simulation and prints its summary.
#[derive(Debug, Parser)]
#[command(name = "gridfort", author, version, about)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Economic seconds to simulate.
    #[arg(long, default_value_t = 300)]
    seconds: u64,

    /// Overrides the master seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,

    /// Resumes from a JSON snapshot instead of starting a new run.
    #[arg(long, value_name = "PATH")]
    resume: Option<PathBuf>,

    /// Writes the final snapshot as JSON.
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Skips the scripted opening build.
    #[arg(long)]
    no_opening: bool,
}

/// Entry point for the Gridfort command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.engine.seed = seed;
    }

    let mut engine = match &args.resume {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("reading snapshot {}", path.display()))?;
            let snapshot: GameSnapshot = serde_json::from_str(&source)
                .with_context(|| format!("parsing snapshot {}", path.display()))?;
            Engine::restore(config, &snapshot).context("restoring snapshot")?
        }
        None => {
            let mut engine = Engine::new(config).context("starting simulation")?;
            if !args.no_opening {
                let placed = opening::place_opening(&mut engine);
                log::info!("opening build placed {placed} structures");
            }
            engine
        }
    };

    engine.run_for(args.seconds);
    println!("{}", engine.summary());

    if let Some(path) = &args.snapshot {
        let json = serde_json::to_string_pretty(&engine.snapshot())
            .context("serializing snapshot")?;
        fs::write(path, json).with_context(|| format!("writing snapshot {}", path.display()))?;
        log::info!("snapshot written to {}", path.display());
    }
    Ok(())
}
