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

//! Classification of raw checker report lines into typed tokens.
//!
//! Every trimmed report line maps to exactly one [`Token`]. Lines that match
//! nothing become [`Token::Other`] and are ignored downstream; classification
//! never fails.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Line opening a counterexample block
pub const COUNTEREXAMPLE_DELIMITER: &str = "[Counterexample]";

/// Text announcing a property violation
pub const VIOLATION_MARKER: &str = "Violated property";

/// Value stored for an empty aggregate such as `{ }`
pub const NULL_VALUE: &str = "None";

/// Characters that start a checker-internal suffix on a variable name
const NAME_SUFFIX_SEPARATORS: &[char] = &['@', '$', '!', '#', '?'];

/// One classified report line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    /// Start of a new counterexample block
    Delimiter,
    /// A property violation, with the source line when the report gives one
    ViolationMarker {
        /// Line of the violated property
        line: Option<usize>,
    },
    /// A checker state transition
    StateMarker {
        /// File the state belongs to
        file: Option<String>,
        /// Line the state belongs to
        line: Option<usize>,
    },
    /// A `name = value` line with both sides normalized
    Assignment {
        /// Variable name without internal suffixes
        name: String,
        /// Value without encoding annotations
        value: String,
    },
    /// Anything else
    Other,
}

struct ReportPatterns {
    state: Regex,
    file: Regex,
    line: Regex,
    assignment: Regex,
    annotation: Regex,
    empty_aggregate: Regex,
    parsing: Regex,
}

impl std::fmt::Debug for ReportPatterns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportPatterns")
            .field("state", &self.state.as_str())
            .field("assignment", &self.assignment.as_str())
            .finish_non_exhaustive()
    }
}

fn report_patterns() -> &'static ReportPatterns {
    static PATTERNS: OnceLock<ReportPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ReportPatterns {
        state: Regex::new(r"^State\s+\d+\b").unwrap(),
        file: Regex::new(r"\bfile\s+(\S+)").unwrap(),
        line: Regex::new(r"\bline\s+(\d+)").unwrap(),
        assignment: Regex::new(r"^([A-Za-z_][\w:.\[\]@$!#?]*)\s*=(.*)$").unwrap(),
        // `3 (00000011)`, `1.5 (0 01111111 ...)`
        annotation: Regex::new(r"\s+\([^()]*\)$").unwrap(),
        empty_aggregate: Regex::new(r"^\{\s*\}$").unwrap(),
        parsing: Regex::new(r"^Parsing\s+(\S+)").unwrap(),
    })
}

/// Classify a single trimmed report line without looking at its neighbours.
///
/// A violation marker only carries a line number here if the marker line
/// itself names one; [`classify_report`] also looks at the following lines.
pub fn classify_line(line: &str) -> Token {
    let line = line.trim();
    let patterns = report_patterns();

    if line == COUNTEREXAMPLE_DELIMITER {
        return Token::Delimiter;
    }

    if line.contains(VIOLATION_MARKER) {
        return Token::ViolationMarker { line: extract_line_number(line) };
    }

    if patterns.state.is_match(line) {
        let file = patterns
            .file
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        return Token::StateMarker { file, line: extract_line_number(line) };
    }

    if let Some(caps) = patterns.assignment.captures(line) {
        let raw_name = caps.get(1).map_or("", |m| m.as_str());
        let rest = caps.get(2).map_or("", |m| m.as_str());

        // `x == 5` is a comparison, not an assignment
        if rest.starts_with('=') {
            return Token::Other;
        }

        let name = normalize_name(raw_name);
        if name.is_empty() {
            return Token::Other;
        }

        return Token::Assignment { name: name.to_string(), value: normalize_value(rest) };
    }

    Token::Other
}

/// Classify every line of a report, in order.
///
/// Exactly one token is produced per line. A violation marker that does not
/// name its line itself takes the first `line N` found in the location text
/// that follows it, up to the next blank line, state marker or delimiter.
pub fn classify_report(report: &str) -> Vec<Token> {
    let lines: Vec<&str> = report.lines().map(str::trim).collect();

    lines
        .iter()
        .enumerate()
        .map(|(index, line)| match classify_line(line) {
            Token::ViolationMarker { line: None } => {
                Token::ViolationMarker { line: violation_line_after(&lines[index + 1..]) }
            }
            token => token,
        })
        .collect()
}

fn violation_line_after(following: &[&str]) -> Option<usize> {
    let patterns = report_patterns();

    for line in following {
        if line.is_empty()
            || *line == COUNTEREXAMPLE_DELIMITER
            || line.contains(VIOLATION_MARKER)
            || patterns.state.is_match(line)
        {
            return None;
        }
        if let Some(number) = extract_line_number(line) {
            return Some(number);
        }
    }

    None
}

fn extract_line_number(text: &str) -> Option<usize> {
    report_patterns()
        .line
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Strip the checker-internal suffix from a variable name (`x@1` becomes `x`)
pub fn normalize_name(raw: &str) -> &str {
    let end = raw.find(NAME_SUFFIX_SEPARATORS).unwrap_or(raw.len());
    raw[..end].trim()
}

/// Normalize a reported value to the text shown to users.
///
/// Trailing parenthesised annotations (binary encodings and the like) and a
/// leading `=` are removed, and an empty aggregate becomes [`NULL_VALUE`].
pub fn normalize_value(raw: &str) -> String {
    let patterns = report_patterns();

    let mut value = raw.trim().trim_start_matches('=').trim();
    while let Some(found) = patterns.annotation.find(value) {
        value = value[..found.start()].trim_end();
    }

    if patterns.empty_aggregate.is_match(value) {
        return NULL_VALUE.to_string();
    }

    value.to_string()
}

/// Path of the analysed file as announced by the report's `Parsing <path>` line
pub fn detect_source_path(report: &str) -> Option<&str> {
    let patterns = report_patterns();
    report
        .lines()
        .map(str::trim)
        .find_map(|line| patterns.parsing.captures(line).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str())
}
