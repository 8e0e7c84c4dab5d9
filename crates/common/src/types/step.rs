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

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Mapping from a user-visible variable name to its latest textual value.
///
/// An ordered map keeps every rendering of a snapshot (JSON, text, harness
/// seed) byte-for-byte reproducible.
pub type VariableSnapshot = BTreeMap<String, String>;

/// One reconstructed execution point: a source line paired with the
/// variables visible when execution reached it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-indexed source line
    pub line: usize,
    /// Copy of the variable memory at emission time
    pub variables: VariableSnapshot,
    /// Whether the checker reported the violated property on this line
    pub violation: bool,
}

impl Step {
    /// Create a new step
    pub fn new(line: usize, variables: VariableSnapshot, violation: bool) -> Self {
        Self { line, variables, violation }
    }

    /// Get the value recorded for `name`, if any
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.violation { "!" } else { " " };
        write!(f, "{marker} line {:>4} |", self.line)?;
        if self.variables.is_empty() {
            return write!(f, " <no variables>");
        }
        for (name, value) in &self.variables {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_display() {
        let mut vars = VariableSnapshot::new();
        vars.insert("b".to_string(), "3".to_string());
        vars.insert("a".to_string(), "1".to_string());

        let step = Step::new(2, vars, false);
        assert_eq!(step.to_string(), "  line    2 | a=1 b=3");

        let violation = Step::new(12, VariableSnapshot::new(), true);
        assert_eq!(violation.to_string(), "! line   12 | <no variables>");
    }

    #[test]
    fn test_step_serialization() {
        let mut vars = VariableSnapshot::new();
        vars.insert("x".to_string(), "None".to_string());

        let step = Step::new(7, vars, true);
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, r#"{"line":7,"variables":{"x":"None"},"violation":true}"#);

        let back: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value_of("x"), Some("None"));
    }
}
