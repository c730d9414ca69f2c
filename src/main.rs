use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use synthground::cli::commands;
use synthground::config::simulation::SimulationConfig;

#[derive(Parser)]
#[command(name = "synthground")]
#[command(about = "A stochastic cellular-automaton engine for solid-state synthesis")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs and per-tick statistics as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation
    Run {
        /// Override the configured number of ticks
        #[arg(short, long)]
        ticks: Option<u32>,
    },

    /// Validate the configuration and reaction library
    Check,

    /// Show the interactions available to a site on the first tick
    Inspect {
        /// Site ID to inspect
        #[arg(short, long)]
        site: u32,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();
    let config_path = Path::new(&cli.config);

    let config = match SimulationConfig::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level, cli.json);

    let result = match cli.command {
        Commands::Run { ticks } => commands::run_simulation(&config, config_path, ticks, cli.json),
        Commands::Check => commands::check(&config, config_path),
        Commands::Inspect { site } => commands::inspect(&config, config_path, site),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
