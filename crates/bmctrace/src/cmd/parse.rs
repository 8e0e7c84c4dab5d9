// BMCTrace - Counterexample Trace Reconstruction
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Parse command - print the reconstructed counterexample trace

use std::path::PathBuf;

use bmctrace_engine::{ParseOptions, TraceParser};
use clap::Args;
use eyre::Result;
use tracing::info;

use super::{read_report_and_source, OutputFormat};
use crate::config::Config;

/// Arguments of `bmctrace parse`
#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Checker report (`-` for standard input)
    #[arg(long)]
    pub report: PathBuf,

    /// Source file that was checked
    #[arg(long)]
    pub source: PathBuf,

    /// Name of the analysed file as the checker saw it
    #[arg(long)]
    pub file_name: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Reconstruct and print the trace
pub fn run_parse(args: &ParseArgs, config: &Config) -> Result<()> {
    let (report, source) = read_report_and_source(&args.report, &args.source)?;

    let options = ParseOptions {
        file_name: args.file_name.clone().or_else(|| config.parser.file_name.clone()),
    };
    let parsed = TraceParser::new(&options).parse(&report, &source);
    info!(steps = parsed.steps.len(), "Parsed counterexample");

    match args.format {
        OutputFormat::Text => print!("{}", parsed.steps.render(Some(&source))),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&parsed)?),
    }

    Ok(())
}
