//! # Aegis Sim
//!
//! Command-line duel runner: resolves a batch of attacks from a TOML
//! scenario and prints outcome statistics.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "aegis-sim", version, about = "Resolve a batch of attacks and report the outcomes")]
struct Args {
    /// Scenario file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the number of attacks
    #[arg(long)]
    trials: Option<u32>,

    /// Override the generator seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    log_json: bool,

    /// Write the default scenario to this path and exit
    #[arg(long)]
    write_default: Option<PathBuf>,
}

/// Main entry point.
fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive("aegis=info".parse()?);
    if args.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    info!("Aegis Sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = args.write_default {
        SimConfig::default()
            .save_to(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        return Ok(());
    }

    let mut config = SimConfig::load_from(&args.config);
    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate();

    let report = report::run(&config);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    info!("Aegis Sim finished");
    Ok(())
}
