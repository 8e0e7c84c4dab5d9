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

//! Summary command - print the verdict of a report

use std::path::PathBuf;

use bmctrace_engine::ReportSummary;
use clap::Args;
use eyre::Result;

use super::{read_input, OutputFormat};

/// Arguments of `bmctrace summary`
#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Checker report (`-` for standard input)
    #[arg(long)]
    pub report: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Print the verdict and its cause
pub fn run_summary(args: &SummaryArgs) -> Result<()> {
    let report = read_input(&args.report)?;
    let summary = ReportSummary::from_report(&report);

    match args.format {
        OutputFormat::Text => {
            println!("Verdict: {}", summary.verdict);
            println!("{}", summary.interpretation());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}
