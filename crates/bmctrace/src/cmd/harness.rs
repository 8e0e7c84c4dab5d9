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

//! Harness command - write a pytest reproduction script

use std::{fs, path::PathBuf};

use bmctrace_engine::{HarnessGenerator, ParseOptions, TraceParser};
use clap::Args;
use eyre::{Context, Result};
use tracing::info;

use super::read_report_and_source;
use crate::config::Config;

/// Arguments of `bmctrace harness`
#[derive(Debug, Args)]
pub struct HarnessArgs {
    /// Checker report (`-` for standard input)
    #[arg(long)]
    pub report: PathBuf,

    /// Source file that was checked
    #[arg(long)]
    pub source: PathBuf,

    /// Where to write the script (default: standard output)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Render the harness seeded with the counterexample's final values
pub fn run_harness(args: &HarnessArgs, config: &Config) -> Result<()> {
    let (report, source) = read_report_and_source(&args.report, &args.source)?;

    let options = ParseOptions { file_name: config.parser.file_name.clone() };
    let parsed = TraceParser::new(&options).parse(&report, &source);

    let script = HarnessGenerator::new(config.harness)
        .render(&source, &parsed.final_variables)
        .wrap_err("Failed to generate the reproduction harness")?;

    match &args.output {
        Some(path) => {
            fs::write(path, &script).with_context(|| format!("Failed to write {path:?}"))?;
            info!("Wrote reproduction harness to {:?}", path);
        }
        None => print!("{script}"),
    }

    Ok(())
}
