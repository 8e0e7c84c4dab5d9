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

//! Verdict and cause extraction from a checker report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{classifier::VIOLATION_MARKER, parser::SUCCESS_MARKER};

/// Sentinel written in place of a report when every timeout tier was exceeded
pub const TIMEOUT_SENTINEL: &str = "TIMEOUT CRÍTICO";

/// Report text announcing a failed verification
pub const FAILURE_MARKER: &str = "VERIFICATION FAILED";

const UNKNOWN_CAUSE: &str = "Unknown error";

/// Overall outcome of a checker run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// No property violation found
    Successful,
    /// A property was violated
    Failed,
    /// Every timeout tier was exceeded
    CriticalTimeout,
    /// The report carries no recognisable verdict
    Unknown,
}

impl Verdict {
    /// Detect the verdict of `report`.
    ///
    /// A timeout wins over a failure, which wins over a success.
    pub fn of(report: &str) -> Self {
        if report.contains(TIMEOUT_SENTINEL) {
            Self::CriticalTimeout
        } else if report.to_uppercase().contains(FAILURE_MARKER) {
            Self::Failed
        } else if report.contains(SUCCESS_MARKER) {
            Self::Successful
        } else {
            Self::Unknown
        }
    }

    /// Human-readable status line
    pub fn status(&self) -> &'static str {
        match self {
            Self::Successful => "Success: no failure found.",
            Self::Failed => "Failure detected!",
            Self::CriticalTimeout => "Error: critical timeout.",
            Self::Unknown => "Inconclusive: no verification verdict in the report.",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::CriticalTimeout => "critical_timeout",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Verdict plus the cause shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Overall outcome
    pub verdict: Verdict,
    /// Short explanation of the outcome
    pub cause: String,
}

impl ReportSummary {
    /// Summarize a raw report
    pub fn from_report(report: &str) -> Self {
        let verdict = Verdict::of(report);
        let cause = match verdict {
            Verdict::Successful => "No failure detected.".to_string(),
            Verdict::CriticalTimeout => "Time limit exceeded.".to_string(),
            Verdict::Failed => violation_cause(report).unwrap_or_else(|| UNKNOWN_CAUSE.to_string()),
            Verdict::Unknown => UNKNOWN_CAUSE.to_string(),
        };
        Self { verdict, cause }
    }

    /// Status line, followed by the cause unless the run succeeded
    pub fn interpretation(&self) -> String {
        match self.verdict {
            Verdict::Successful => self.verdict.status().to_string(),
            _ => format!("{}\nCause: {}", self.verdict.status(), self.cause),
        }
    }
}

/// The violated property's description, found below the first violation marker.
///
/// The checker prints the location on the line after the marker and the
/// property kind after that, so the description sits two lines down unless a
/// rule or blank line pushes it one further.
fn violation_cause(report: &str) -> Option<String> {
    let lines: Vec<&str> = report.split('\n').collect();
    let marker = lines.iter().position(|line| line.contains(VIOLATION_MARKER))?;

    let candidate = lines.get(marker + 2)?.trim();
    if !candidate.is_empty() && !candidate.contains("-----") {
        return Some(candidate.to_string());
    }

    lines.get(marker + 3).map(|line| line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAILED_REPORT: &str = "\
[Counterexample]

State 1 file prog.py line 1 column 0 function main thread 0
----------------------------------------------------
  a = 1 (00000001)

Violated property:
  file prog.py line 3 column 0 function main
  assertion
  b > 5

VERIFICATION FAILED
";

    #[test]
    fn test_verdict_precedence() {
        assert_eq!(Verdict::of("TIMEOUT CRÍTICO\nVERIFICATION FAILED"), Verdict::CriticalTimeout);
        assert_eq!(Verdict::of("verification failed\nVERIFICATION SUCCESSFUL"), Verdict::Failed);
        assert_eq!(Verdict::of("VERIFICATION SUCCESSFUL"), Verdict::Successful);
        assert_eq!(Verdict::of("ERROR: PARSING ERROR"), Verdict::Unknown);
    }

    #[test]
    fn test_failure_cause() {
        let summary = ReportSummary::from_report(FAILED_REPORT);
        assert_eq!(summary.verdict, Verdict::Failed);
        assert_eq!(summary.cause, "assertion");
        assert_eq!(summary.interpretation(), "Failure detected!\nCause: assertion");
    }

    #[test]
    fn test_cause_skips_rule() {
        let report = "Violated property:\n  file prog.py line 3\n  ---------\n  division by zero\nVERIFICATION FAILED";
        assert_eq!(ReportSummary::from_report(report).cause, "division by zero");
    }

    #[test]
    fn test_cause_defaults_when_missing() {
        assert_eq!(ReportSummary::from_report("VERIFICATION FAILED").cause, "Unknown error");
        assert_eq!(ReportSummary::from_report("Violated property:\nVERIFICATION FAILED").cause, "Unknown error");
    }

    #[test]
    fn test_success_and_timeout_interpretation() {
        let success = ReportSummary::from_report("VERIFICATION SUCCESSFUL");
        assert_eq!(success.interpretation(), "Success: no failure found.");

        let timeout = ReportSummary::from_report(TIMEOUT_SENTINEL);
        assert_eq!(timeout.interpretation(), "Error: critical timeout.\nCause: Time limit exceeded.");
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(serde_json::to_string(&Verdict::CriticalTimeout).unwrap(), "\"critical_timeout\"");
        assert_eq!(Verdict::Failed.to_string(), "failed");
    }
}
