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

use std::{
    fmt::Write as _,
    ops::{Deref, DerefMut},
};

use serde::{Deserialize, Serialize};

use super::Step;

/// Ordered sequence of reconstructed steps, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    inner: Vec<Step>,
}

impl Deref for Trace {
    type Target = Vec<Step>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Trace {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl From<Vec<Step>> for Trace {
    fn from(inner: Vec<Step>) -> Self {
        Self { inner }
    }
}

impl Trace {
    /// Create a new empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert trace to serde_json::Value for HTTP serialization
    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// The first step flagged as the violated property, if any
    pub fn violation_step(&self) -> Option<&Step> {
        self.inner.iter().find(|step| step.violation)
    }

    /// Source lines visited by the trace, in discovery order
    pub fn lines(&self) -> Vec<usize> {
        self.inner.iter().map(|step| step.line).collect()
    }

    /// Render the trace as a plain-text table.
    ///
    /// When the original source is supplied, each row also shows the text of
    /// the line it points at.
    pub fn render(&self, source: Option<&str>) -> String {
        let mut out = String::new();

        if self.inner.is_empty() {
            out.push_str("No counterexample steps reconstructed\n");
            return out;
        }

        let source_lines: Vec<&str> = source.map(|s| s.split('\n').collect()).unwrap_or_default();

        for (index, step) in self.inner.iter().enumerate() {
            let _ = writeln!(out, "#{:<3} {step}", index + 1);
            if let Some(text) = step.line.checked_sub(1).and_then(|i| source_lines.get(i)) {
                let _ = writeln!(out, "      > {}", text.trim_end());
            }
        }

        if let Some(step) = self.violation_step() {
            let _ = writeln!(out, "Violated property at line {}", step.line);
        }

        out
    }
}

// IntoIterator for owned Trace (moves out its contents)
impl IntoIterator for Trace {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

// IntoIterator for &Trace (shared iteration)
impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VariableSnapshot;

    fn snapshot(pairs: &[(&str, &str)]) -> VariableSnapshot {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_trace_serializes_as_list() {
        let trace = Trace::from(vec![
            Step::new(1, snapshot(&[("a", "1")]), false),
            Step::new(3, snapshot(&[("a", "1")]), true),
        ]);

        let value = trace.to_json_value().unwrap();
        assert!(value.is_array());
        assert_eq!(value[1]["line"], 3);
        assert_eq!(value[1]["violation"], true);
    }

    #[test]
    fn test_violation_step_and_lines() {
        let trace = Trace::from(vec![
            Step::new(5, VariableSnapshot::new(), false),
            Step::new(2, VariableSnapshot::new(), false),
            Step::new(9, VariableSnapshot::new(), true),
        ]);

        assert_eq!(trace.lines(), vec![5, 2, 9]);
        assert_eq!(trace.violation_step().map(|s| s.line), Some(9));
    }

    #[test]
    fn test_render_with_source() {
        let trace = Trace::from(vec![
            Step::new(1, snapshot(&[("a", "1")]), false),
            Step::new(2, snapshot(&[("a", "1")]), true),
        ]);

        let rendered = trace.render(Some("a = 1\nassert a > 2"));
        assert!(rendered.contains("> a = 1"));
        assert!(rendered.contains("> assert a > 2"));
        assert!(rendered.contains("Violated property at line 2"));

        assert!(Trace::new().render(None).contains("No counterexample steps"));
    }
}
