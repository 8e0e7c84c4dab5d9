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

use bmctrace_common::types::{Trace, VariableSnapshot};
use serde::{Deserialize, Serialize};

use crate::{
    harness::{HarnessError, HarnessGenerator},
    parser::{ParseOptions, TraceParser},
    report::{ReportSummary, Verdict},
};

/// Everything a client needs to present one checker run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    /// Command line that produced the report, when known
    pub command: Option<String>,
    /// The report exactly as received
    pub raw_output: String,
    /// Status line, plus the cause for anything but success
    pub interpretation: String,
    /// Overall outcome
    pub verdict: Verdict,
    /// Reconstructed steps
    pub counterexample: Trace,
    /// Variable values after the last step
    pub final_variables: VariableSnapshot,
    /// Checker run time in seconds, when known
    pub elapsed: Option<f64>,
    /// Reproduction script
    pub pytest_code: String,
}

impl VerificationResponse {
    /// Summarize `report`, reconstruct its counterexample against `source`,
    /// and render the reproduction harness.
    pub fn build(
        report: &str,
        source: &str,
        options: &ParseOptions,
        generator: &HarnessGenerator,
    ) -> Result<Self, HarnessError> {
        let summary = ReportSummary::from_report(report);
        let parsed = TraceParser::new(options).parse(report, source);
        let pytest_code = generator.render(source, &parsed.final_variables)?;

        Ok(Self {
            command: None,
            raw_output: report.to_string(),
            interpretation: summary.interpretation(),
            verdict: summary.verdict,
            counterexample: parsed.steps,
            final_variables: parsed.final_variables,
            elapsed: None,
            pytest_code,
        })
    }

    /// Attach the command line that produced the report
    pub fn with_command(mut self, command: Option<String>) -> Self {
        self.command = command;
        self
    }

    /// Attach the checker run time
    pub fn with_elapsed(mut self, elapsed: Option<f64>) -> Self {
        self.elapsed = elapsed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::HarnessConfig;

    #[test]
    fn test_build_failed_run() {
        let report = "State 1 file prog.py line 1 thread 0\n  a = 1 (00000001)\nViolated property:\n  file prog.py line 2\n  assertion\n  a > 5\nVERIFICATION FAILED";
        let source = "a = 1\nassert a > 5";

        let response =
            VerificationResponse::build(report, source, &ParseOptions::default(), &HarnessGenerator::default())
                .unwrap()
                .with_command(Some("esbmc prog.py".to_string()));

        assert_eq!(response.verdict, Verdict::Failed);
        assert_eq!(response.counterexample.lines(), vec![1, 2]);
        assert_eq!(response.final_variables.get("a").map(String::as_str), Some("1"));
        assert!(response.interpretation.starts_with("Failure detected!"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["command"], "esbmc prog.py");
        assert_eq!(json["verdict"], "failed");
        assert_eq!(json["counterexample"][1]["violation"], true);
        assert!(json["elapsed"].is_null());
    }

    #[test]
    fn test_build_propagates_harness_errors() {
        let generator = HarnessGenerator::new(HarnessConfig { nondet_int_min: 1, nondet_int_max: 0, nondet_uint_max: 1 });
        let result = VerificationResponse::build("VERIFICATION SUCCESSFUL", "", &ParseOptions::default(), &generator);

        assert!(matches!(result, Err(HarnessError::InvalidRange { .. })));
    }
}
