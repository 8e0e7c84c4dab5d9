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

//! The trace state machine.
//!
//! Tokens are consumed in report order. The machine keeps a notion of the
//! current source line, the latest value of every user variable, and one
//! call tracker per function so that steps can be placed at call sites the
//! report never names explicitly.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use bmctrace_common::types::{Trace, VariableSnapshot};
use tracing::{debug, trace};

use crate::{classifier::Token, emitter::StepEmitter, scanner::SourceIndex};

/// Where the machine currently is in the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MachineState {
    /// No line reached yet
    #[default]
    Idle,
    /// Execution is at this line
    AtLine(usize),
    /// Execution is at this line and the checker reported the violation here
    AtViolation(usize),
}

impl MachineState {
    /// Line of the pending step, if any
    pub fn current_line(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::AtLine(line) | Self::AtViolation(line) => Some(*line),
        }
    }

    /// Whether leaving this state emits a step
    pub fn shows_step(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    fn is_violation(&self) -> bool {
        matches!(self, Self::AtViolation(_))
    }
}

/// Per-function bookkeeping used to attribute parameter assignments to call sites
#[derive(Debug, Clone, Default)]
struct CallTracker {
    cursor: usize,
    seen_since_advance: HashSet<String>,
    injected_cursors: HashSet<usize>,
}

/// Consumes classified report tokens and builds the step trace
#[derive(Debug)]
pub struct TraceStateMachine<'a> {
    index: &'a SourceIndex,
    target_file: Option<String>,
    state: MachineState,
    memory: VariableSnapshot,
    emitter: StepEmitter,
    trackers: HashMap<String, CallTracker>,
    blocks_seen: usize,
    halted: bool,
}

impl<'a> TraceStateMachine<'a> {
    /// Create a machine over `index`.
    ///
    /// When `target_file` is given, only state markers whose file has the
    /// same basename are followed.
    pub fn new(index: &'a SourceIndex, target_file: Option<&str>) -> Self {
        Self {
            index,
            target_file: target_file.map(|file| basename(file).to_string()),
            state: MachineState::Idle,
            memory: VariableSnapshot::new(),
            emitter: StepEmitter::new(index.total_lines()),
            trackers: HashMap::new(),
            blocks_seen: 0,
            halted: false,
        }
    }

    /// Current state
    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Whether a second counterexample block stopped processing
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Feed every token in order, then finish
    pub fn run<'t>(mut self, tokens: impl IntoIterator<Item = &'t Token>) -> (Trace, VariableSnapshot) {
        for token in tokens {
            self.feed(token);
            if self.halted {
                break;
            }
        }
        self.finish()
    }

    /// Apply one token
    pub fn feed(&mut self, token: &Token) {
        if self.halted {
            return;
        }

        match token {
            Token::Delimiter => self.on_delimiter(),
            Token::ViolationMarker { line } => self.on_violation(*line),
            Token::StateMarker { file, line } => self.on_state(file.as_deref(), *line),
            Token::Assignment { name, value } => self.on_assignment(name, value),
            Token::Other => {}
        }
    }

    /// Emit the pending step and return the trace with the final variable memory
    pub fn finish(mut self) -> (Trace, VariableSnapshot) {
        self.flush_pending();
        (self.emitter.into_trace(), self.memory)
    }

    fn on_delimiter(&mut self) {
        self.blocks_seen += 1;
        if self.blocks_seen >= 2 {
            debug!("Second counterexample block reached, ignoring the rest of the report");
            self.halted = true;
        }
    }

    fn on_violation(&mut self, line: Option<usize>) {
        if line.is_some_and(|line| !self.in_source(line)) {
            trace!(line, "Ignoring violation outside the source");
            return;
        }

        match (line, self.state) {
            (Some(line), state) => {
                if state.current_line().is_some_and(|current| current != line) {
                    self.flush_pending();
                }
                self.state = MachineState::AtViolation(line);
            }
            (None, MachineState::AtLine(current)) => {
                self.state = MachineState::AtViolation(current);
            }
            (None, _) => {}
        }
        trace!(state = ?self.state, "Violation marker");
    }

    fn on_state(&mut self, file: Option<&str>, line: Option<usize>) {
        let (Some(file), Some(line)) = (file, line) else {
            return;
        };

        if !self.in_source(line) {
            trace!(file, line, "Ignoring state outside the source");
            return;
        }

        if let Some(target) = &self.target_file {
            if basename(file) != target {
                trace!(file, line, "Skipping state outside the analysed file");
                return;
            }
        }

        self.move_to(line);
    }

    fn on_assignment(&mut self, name: &str, value: &str) {
        if !self.index.is_allowed(name) {
            return;
        }

        self.memory.insert(name.to_string(), value.to_string());

        if !self.try_inject_call_site(name) {
            self.infer_from_declaration(name);
        }
    }

    /// Place a step at the call site a parameter assignment belongs to.
    ///
    /// A parameter assigned a second time since the tracker last advanced
    /// marks the next call, so the tracker moves on to the next call site.
    fn try_inject_call_site(&mut self, name: &str) -> bool {
        let index = self.index;
        let Some(owner) = index.param_owner(name) else {
            return false;
        };
        let sites = index.call_sites(owner);
        if sites.is_empty() {
            return false;
        }

        let current = self.state.current_line();
        let tracker = self.trackers.entry(owner.to_string()).or_default();

        if tracker.seen_since_advance.contains(name) {
            tracker.cursor += 1;
            tracker.seen_since_advance.clear();
        }
        tracker.seen_since_advance.insert(name.to_string());

        let cursor = tracker.cursor;
        let Some(&site) = sites.get(cursor) else {
            return false;
        };
        if current == Some(site) || tracker.injected_cursors.contains(&cursor) {
            return false;
        }
        tracker.injected_cursors.insert(cursor);

        debug!(function = owner, parameter = name, call_site = site, "Injecting call-site step");
        self.flush_pending();
        self.state = MachineState::AtLine(site);
        self.emitter.emit(site, &self.memory, false);
        true
    }

    /// Move to a variable's declaration line when nothing else explains the assignment
    fn infer_from_declaration(&mut self, name: &str) {
        let Some(declared) = self.index.decl_line(name) else {
            return;
        };

        let current = self.state.current_line();
        if current == Some(declared) {
            return;
        }

        let forward = current.is_none_or(|line| declared > line);
        if !self.emitter.shown_any() || forward || self.index.is_parameter(name) {
            debug!(variable = name, line = declared, "Inferring line from declaration");
            self.flush_pending();
            self.state = MachineState::AtLine(declared);
        }
    }

    fn in_source(&self, line: usize) -> bool {
        (1..=self.index.total_lines()).contains(&line)
    }

    fn move_to(&mut self, line: usize) {
        if self.state.current_line() != Some(line) {
            self.flush_pending();
            self.state = MachineState::AtLine(line);
        }
    }

    fn flush_pending(&mut self) {
        if let Some(line) = self.state.current_line() {
            self.emitter.emit(line, &self.memory, self.state.is_violation());
        }
    }
}

fn basename(path: &str) -> &str {
    Path::new(path).file_name().and_then(|name| name.to_str()).unwrap_or(path)
}
