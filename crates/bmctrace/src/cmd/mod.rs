//! Command modules for the BMCTrace CLI

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use clap::ValueEnum;
use eyre::{Context, Result};

pub mod harness;
pub mod parse;
pub mod serve;
pub mod summary;

pub use harness::{run_harness, HarnessArgs};
pub use parse::{run_parse, ParseArgs};
pub use serve::{run_serve, ServeArgs};
pub use summary::{run_summary, SummaryArgs};

/// Output format of one-shot commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

fn is_stdin(path: &Path) -> bool {
    path == Path::new("-")
}

/// Read a text input; `-` reads standard input
pub fn read_input(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content).wrap_err("Failed to read standard input")?;
        return Ok(content);
    }

    fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))
}

/// Read the report and the source; at most one of them may come from standard input
pub fn read_report_and_source(report: &Path, source: &Path) -> Result<(String, String)> {
    if is_stdin(report) && is_stdin(source) {
        eyre::bail!("--report and --source cannot both be read from standard input");
    }

    Ok((read_input(report)?, read_input(source)?))
}
