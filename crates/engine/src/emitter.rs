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

//! Deduplicating step emission.

use bmctrace_common::types::{Step, Trace, VariableSnapshot};
use tracing::trace;

/// Single point through which steps enter a trace.
///
/// Steps outside `[1, total_lines]` are dropped. A step on the same line as
/// the previous non-violation step replaces it instead of being appended.
#[derive(Debug, Clone, Default)]
pub struct StepEmitter {
    total_lines: usize,
    trace: Trace,
    shown_any: bool,
}

impl StepEmitter {
    /// Create an emitter for a source of `total_lines` lines
    pub fn new(total_lines: usize) -> Self {
        Self { total_lines, trace: Trace::new(), shown_any: false }
    }

    /// Record a step for `line` with a copy of `variables`
    pub fn emit(&mut self, line: usize, variables: &VariableSnapshot, violation: bool) {
        if line == 0 || line > self.total_lines {
            trace!(line, total_lines = self.total_lines, "Dropping out-of-range step");
            return;
        }

        let step = Step::new(line, variables.clone(), violation);
        match self.trace.last_mut() {
            Some(last) if last.line == line && !last.violation => {
                trace!(line, "Replacing step on repeated line");
                *last = step;
            }
            _ => self.trace.push(step),
        }

        self.shown_any = true;
    }

    /// Whether any step has been recorded yet
    pub fn shown_any(&self) -> bool {
        self.shown_any
    }

    /// Steps recorded so far
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Consume the emitter, returning the recorded steps
    pub fn into_trace(self) -> Trace {
        self.trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> VariableSnapshot {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_out_of_range_lines_are_dropped() {
        let mut emitter = StepEmitter::new(3);
        emitter.emit(0, &vars(&[]), false);
        emitter.emit(4, &vars(&[]), true);

        assert!(emitter.trace().is_empty());
        assert!(!emitter.shown_any());
    }

    #[test]
    fn test_repeated_line_replaces_previous_step() {
        let mut emitter = StepEmitter::new(10);
        emitter.emit(2, &vars(&[("a", "1")]), false);
        emitter.emit(2, &vars(&[("a", "2")]), false);

        let trace = emitter.into_trace();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0].value_of("a"), Some("2"));
    }

    #[test]
    fn test_violation_step_is_never_replaced() {
        let mut emitter = StepEmitter::new(10);
        emitter.emit(4, &vars(&[("a", "1")]), true);
        emitter.emit(4, &vars(&[("a", "2")]), false);

        let trace = emitter.into_trace();
        assert_eq!(trace.lines(), vec![4, 4]);
        assert!(trace[0].violation);
        assert_eq!(trace[0].value_of("a"), Some("1"));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut memory = vars(&[("a", "1")]);
        let mut emitter = StepEmitter::new(10);
        emitter.emit(1, &memory, false);
        memory.insert("a".to_string(), "9".to_string());

        assert_eq!(emitter.trace()[0].value_of("a"), Some("1"));
        assert!(emitter.shown_any());
    }
}
