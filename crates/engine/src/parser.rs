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

//! Counterexample parsing entry points.

use bmctrace_common::types::{Trace, VariableSnapshot};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    classifier::{classify_report, detect_source_path, Token},
    machine::TraceStateMachine,
    scanner::SourceIndex,
};

/// Report text meaning no counterexample exists
pub const SUCCESS_MARKER: &str = "VERIFICATION SUCCESSFUL";

/// Options controlling how a report is matched to the source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Name of the analysed file as the checker saw it.
    ///
    /// Only its basename is compared against state markers. When unset, the
    /// report's `Parsing <path>` line is used, and failing that, states from
    /// any file are followed.
    pub file_name: Option<String>,
}

/// Result of reconstructing a counterexample
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTrace {
    /// Reconstructed steps in discovery order
    pub steps: Trace,
    /// Variable memory after the last processed token
    pub final_variables: VariableSnapshot,
}

impl ParsedTrace {
    /// Whether no step was reconstructed
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Rebuilds source-level counterexample traces from checker reports
#[derive(Debug, Clone, Default)]
pub struct TraceParser {
    options: ParseOptions,
}

impl TraceParser {
    /// Create a parser with the given options
    pub fn new(options: &ParseOptions) -> Self {
        Self { options: options.clone() }
    }

    /// Reconstruct the counterexample in `report` against `source`.
    ///
    /// Never fails: a successful verification and a report without any state
    /// or violation marker both produce an empty trace and an empty variable
    /// map, whatever assignments the report lists.
    pub fn parse(&self, report: &str, source: &str) -> ParsedTrace {
        if report.contains(SUCCESS_MARKER) {
            debug!("Report announces a successful verification, nothing to reconstruct");
            return ParsedTrace::default();
        }

        let index = SourceIndex::scan(source);
        let tokens = classify_report(report);
        debug!(
            lines = tokens.len(),
            allowlisted = index.allowlist().len(),
            functions = index.functions().len(),
            assignments = tokens.iter().filter(|t| matches!(t, Token::Assignment { .. })).count(),
            states = tokens.iter().filter(|t| matches!(t, Token::StateMarker { .. })).count(),
            "Classified report"
        );

        let has_markers = tokens
            .iter()
            .any(|t| matches!(t, Token::StateMarker { .. } | Token::ViolationMarker { .. }));
        if !has_markers {
            debug!("Report has no state or violation markers, nothing to reconstruct");
            return ParsedTrace::default();
        }

        let target = self.options.file_name.as_deref().or_else(|| detect_source_path(report));
        let (steps, final_variables) = TraceStateMachine::new(&index, target).run(&tokens);

        debug!(steps = steps.len(), variables = final_variables.len(), "Reconstructed trace");
        ParsedTrace { steps, final_variables }
    }
}

/// Reconstruct a counterexample with default options
pub fn parse_counterexample(report: &str, source: &str) -> ParsedTrace {
    TraceParser::default().parse(report, source)
}
