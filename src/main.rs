use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod error;
mod executor;
mod export;
mod grid;
mod metrics;
mod models;
mod orchestrator;
mod output;
mod runner;
mod statistics;
mod text;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::runner::Runner;

/// LLM Parameter Sweep CLI - Run a prompt across a parameter grid and score every response
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output format: plain, json or csv
    #[arg(short, long, global = true, default_value = "plain")]
    output: OutputFormat,

    /// Verbose output - show progress for each run and retry
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every experiment in a TOML configuration file
    Run {
        /// Path to the TOML configuration file
        run_file: PathBuf,
    },
    /// Load previously stored experiment records
    Import {
        /// Path to a JSON file with one record or an array of records
        file: PathBuf,

        /// Recompute metrics and statistics from the stored texts
        #[arg(long)]
        rescore: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let records = match args.command {
        Command::Run { run_file } => {
            let config = Config::from_file(&run_file)?;
            Runner::new(config).run_experiments().await?
        }
        Command::Import { file, rescore } => {
            let mut records = export::import_records(&file)?;
            if rescore {
                records.iter_mut().for_each(export::rescore);
            }
            records
        }
    };

    output::print_records(&records, args.output)?;

    Ok(())
}
