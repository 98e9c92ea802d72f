//! Assemble a scenario and print its topology.
//!
//! Usage: `trellis <monolithic|single|separate> [--config FILE] [--seed N] [--output FILE]`

use std::{fs, path::PathBuf, process};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use trellis_scenarios::{ScenarioConfig, Variant};

#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(about = "Assemble a co-simulation scenario and write its topology as JSON")]
struct Args {
    /// Scenario to assemble
    #[arg(value_enum)]
    scenario: Variant,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed of the random stream, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Write the topology here instead of standard output
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    init_logging();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ScenarioConfig::from_toml_file(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    info!(scenario = %args.scenario, seed = config.seed, "assembling scenario");
    let topology = args.scenario.assemble(&config)?;
    let document = serde_json::to_string_pretty(&topology)?;

    match &args.output {
        Some(path) => {
            fs::write(path, document)?;
            info!(path = %path.display(), "wrote topology");
        }
        None => println!("{document}"),
    }
    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trellis=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
