//! BMCTrace - Counterexample Trace Reconstruction
//!
//! Turns a bounded model checker's textual report into a step-by-step trace
//! over the analysed source, from the command line or over HTTP.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use tracing::Level;

mod cmd;
mod config;

use config::Config;

/// Command-line interface for BMCTrace
#[derive(Debug, Parser)]
#[command(name = "bmctrace")]
#[command(about = "BMCTrace - rebuild source-level counterexample traces from ESBMC reports")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ~/.bmctrace.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconstruct the counterexample trace of a report
    Parse(cmd::ParseArgs),
    /// Print the verdict and cause of a report
    Summary(cmd::SummaryArgs),
    /// Write a pytest script reproducing a report's counterexample
    Harness(cmd::HarnessArgs),
    /// Serve the HTTP interface
    Serve(cmd::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if std::env::var("RUST_LOG").is_err() {
        let level = match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    match &cli.command {
        Commands::Serve(_) => bmctrace_common::logging::init_logging("bmctrace", true)?,
        _ => bmctrace_common::logging::init_simple_logging(Level::WARN)?,
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse(args) => cmd::run_parse(&args, &config),
        Commands::Summary(args) => cmd::run_summary(&args),
        Commands::Harness(args) => cmd::run_harness(&args, &config),
        Commands::Serve(args) => cmd::run_serve(args, &config).await,
    }
}
