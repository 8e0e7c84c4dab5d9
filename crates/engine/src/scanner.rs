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

//! Static scanning of the analysed source text.
//!
//! The scanner makes a single left-to-right pass over the source and records
//! which identifiers the user declared, where they were first declared, which
//! function owns each parameter, and on which lines each function is called.
//! These tables are what lets the state machine tell user variables apart from
//! checker internals and place steps the report never marks explicitly.
//!
//! The scan is purely textual. It does not know about comments or string
//! literals, so a call written inside a comment is recorded as a call site.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::OnceLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Words that can precede `:` or `(` at the start of a line without being user identifiers
const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Implicit receiver names dropped when they are the first parameter
const IMPLICIT_RECEIVERS: &[&str] = &["self", "cls"];

/// A function declared in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Parameter names in declaration order, without the implicit receiver
    pub params: Vec<String>,
    /// Line of the `def`
    pub line: usize,
}

struct SourcePatterns {
    function_def: Regex,
    for_binding: Regex,
    assignment: Regex,
    call: Regex,
    identifier: Regex,
}

impl std::fmt::Debug for SourcePatterns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcePatterns")
            .field("function_def", &self.function_def.as_str())
            .field("for_binding", &self.for_binding.as_str())
            .field("assignment", &self.assignment.as_str())
            .field("call", &self.call.as_str())
            .finish()
    }
}

fn source_patterns() -> &'static SourcePatterns {
    static PATTERNS: OnceLock<SourcePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| SourcePatterns {
        function_def: Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(([^)]*)").unwrap(),
        for_binding: Regex::new(r"^\s*(?:async\s+)?for\s+(.+?)\s+in\b").unwrap(),
        // `name = ...` or `name: type = ...`, but never `name == ...`
        assignment: Regex::new(r"^\s*([A-Za-z_]\w*)\s*(?::[^=]*)?=(?:[^=]|$)").unwrap(),
        call: Regex::new(r"\b([A-Za-z_]\w*)\s*\(").unwrap(),
        identifier: Regex::new(r"^[A-Za-z_]\w*$").unwrap(),
    })
}

fn is_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

fn is_identifier(name: &str) -> bool {
    source_patterns().identifier.is_match(name) && !is_keyword(name)
}

/// Lookup tables built from the analysed source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceIndex {
    total_lines: usize,
    allowlist: BTreeSet<String>,
    decl_lines: BTreeMap<String, usize>,
    param_owner: BTreeMap<String, String>,
    call_sites: BTreeMap<String, Vec<usize>>,
    functions: Vec<FunctionSignature>,
}

impl SourceIndex {
    /// Scan `source` and build its lookup tables.
    ///
    /// Ties are resolved by first occurrence: a name keeps the first line that
    /// declared it and a parameter keeps the first function that declared it.
    pub fn scan(source: &str) -> Self {
        let patterns = source_patterns();
        let mut index = Self::default();
        let mut calls: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (offset, raw) in source.split('\n').enumerate() {
            let line_no = offset + 1;
            let line = raw.trim_end_matches('\r');
            index.total_lines = line_no;

            let mut defined_here: Option<&str> = None;

            if let Some(caps) = patterns.function_def.captures(line) {
                let name = caps.get(1).map_or("", |m| m.as_str());
                let params = parse_parameters(caps.get(2).map_or("", |m| m.as_str()));
                for param in &params {
                    index.declare(param, line_no);
                    index.param_owner.entry(param.clone()).or_insert_with(|| name.to_string());
                }
                index.functions.push(FunctionSignature {
                    name: name.to_string(),
                    params,
                    line: line_no,
                });
                defined_here = Some(name);
            } else if let Some(caps) = patterns.for_binding.captures(line) {
                for name in caps.get(1).map_or("", |m| m.as_str()).split(',') {
                    let name = name.trim().trim_matches(|c: char| c == '(' || c == ')').trim();
                    if is_identifier(name) {
                        index.declare(name, line_no);
                    }
                }
            } else if let Some(caps) = patterns.assignment.captures(line) {
                let name = caps.get(1).map_or("", |m| m.as_str());
                if !is_keyword(name) {
                    index.declare(name, line_no);
                }
            }

            for caps in patterns.call.captures_iter(line) {
                let callee = caps.get(1).map_or("", |m| m.as_str());
                if defined_here == Some(callee) || is_keyword(callee) {
                    continue;
                }
                let lines = calls.entry(callee.to_string()).or_default();
                if lines.last() != Some(&line_no) {
                    lines.push(line_no);
                }
            }
        }

        // Only calls to functions the user declared are interesting
        index.call_sites = calls
            .into_iter()
            .filter(|(callee, _)| index.functions.iter().any(|f| &f.name == callee))
            .collect();

        trace!(
            total_lines = index.total_lines,
            variables = index.allowlist.len(),
            functions = index.functions.len(),
            "Scanned source"
        );

        index
    }

    fn declare(&mut self, name: &str, line: usize) {
        self.allowlist.insert(name.to_string());
        self.decl_lines.entry(name.to_string()).or_insert(line);
    }

    /// Number of lines in the source; bounds every valid step line
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Names eligible to appear in a step snapshot
    pub fn allowlist(&self) -> &BTreeSet<String> {
        &self.allowlist
    }

    /// Whether `name` was declared anywhere in the source
    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowlist.contains(name)
    }

    /// First line declaring `name`
    pub fn decl_line(&self, name: &str) -> Option<usize> {
        self.decl_lines.get(name).copied()
    }

    /// Function owning the parameter `name`
    pub fn param_owner(&self, name: &str) -> Option<&str> {
        self.param_owner.get(name).map(String::as_str)
    }

    /// Whether `name` is a parameter of some function
    pub fn is_parameter(&self, name: &str) -> bool {
        self.param_owner.contains_key(name)
    }

    /// Lines calling `function`, in source order
    pub fn call_sites(&self, function: &str) -> &[usize] {
        self.call_sites.get(function).map(Vec::as_slice).unwrap_or_default()
    }

    /// Declared functions, in source order
    pub fn functions(&self) -> &[FunctionSignature] {
        &self.functions
    }
}

/// Split a `def` parameter list into plain parameter names.
///
/// Annotations, defaults and `*`/`**` markers are stripped; the bare `*` and
/// `/` separators and a leading implicit receiver are dropped.
fn parse_parameters(raw: &str) -> Vec<String> {
    let mut params = Vec::new();

    for (position, piece) in raw.split(',').enumerate() {
        let name = piece.split([':', '=']).next().unwrap_or_default().trim();
        let name = name.trim_start_matches('*').trim();
        if !is_identifier(name) {
            continue;
        }
        if position == 0 && IMPLICIT_RECEIVERS.contains(&name) {
            continue;
        }
        params.push(name.to_string());
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_assignments() {
        let index = SourceIndex::scan("a = 1\nb: int = a + 2\nassert b > 5");

        assert_eq!(index.total_lines(), 3);
        assert_eq!(index.decl_line("a"), Some(1));
        assert_eq!(index.decl_line("b"), Some(2));
        assert!(index.is_allowed("a"));
        assert!(!index.is_allowed("assert"));
    }

    #[test]
    fn test_first_declaration_wins() {
        let index = SourceIndex::scan("x = 0\nx = x + 1\nfor x in range(3):\n    pass");

        assert_eq!(index.decl_line("x"), Some(1));
    }

    #[test]
    fn test_comparison_is_not_a_declaration() {
        let index = SourceIndex::scan("y = 2\ny == 3\nz <= 4\nw += 1");

        assert_eq!(index.decl_line("y"), Some(1));
        assert!(!index.is_allowed("z"));
        assert!(!index.is_allowed("w"));
    }

    #[test]
    fn test_loop_bindings() {
        let index = SourceIndex::scan("for i in range(3):\n    pass\nfor (k, v) in items:\n    pass");

        assert_eq!(index.decl_line("i"), Some(1));
        assert_eq!(index.decl_line("k"), Some(3));
        assert_eq!(index.decl_line("v"), Some(3));
    }

    #[test]
    fn test_keywords_before_colon_are_skipped() {
        let index = SourceIndex::scan("if a:\n    pass\nelse: b = 1\nc = 2");

        assert!(!index.is_allowed("else"));
        assert!(!index.is_allowed("if"));
        assert_eq!(index.decl_line("c"), Some(4));
    }

    #[test]
    fn test_function_parameters() {
        let source = "class Acc:\n    def add(self, amount: int, *rest, scale=2, **kw):\n        return amount\n";
        let index = SourceIndex::scan(source);

        let add = &index.functions()[0];
        assert_eq!(add.name, "add");
        assert_eq!(add.params, vec!["amount", "rest", "scale", "kw"]);
        assert_eq!(add.line, 2);
        assert_eq!(index.param_owner("amount"), Some("add"));
        assert_eq!(index.decl_line("scale"), Some(2));
        assert!(!index.is_parameter("self"));
        assert!(!index.is_allowed("self"));
    }

    #[test]
    fn test_param_owner_first_function_wins() {
        let index = SourceIndex::scan("def f(x):\n    return x\ndef g(x):\n    return x");

        assert_eq!(index.param_owner("x"), Some("f"));
        assert_eq!(index.decl_line("x"), Some(1));
    }

    #[test]
    fn test_call_sites_exclude_declaration() {
        let source = "def f(x):\n    return x + 1\n\n\na = f(1)\n\n\n\nb = f(2) + f(3)\nprint(b)";
        let index = SourceIndex::scan(source);

        assert_eq!(index.call_sites("f"), &[5, 9]);
        // builtins are not user functions
        assert!(index.call_sites("print").is_empty());
    }

    #[test]
    fn test_call_before_definition() {
        let index = SourceIndex::scan("def main():\n    helper(2)\ndef helper(n):\n    return n\nmain()");

        assert_eq!(index.call_sites("helper"), &[2]);
        assert_eq!(index.call_sites("main"), &[5]);
    }

    #[test]
    fn test_comment_lines_are_scanned_textually() {
        let source = "def f(x):\n    return x\n# f(10) is the slow path\n# total = 3\ny = f(1)";
        let index = SourceIndex::scan(source);

        // A call written in a comment still counts as a call site
        assert_eq!(index.call_sites("f"), &[3, 5]);
        // A commented-out assignment does not start with an identifier
        assert!(!index.is_allowed("total"));
        assert_eq!(index.decl_line("y"), Some(5));
    }

    #[test]
    fn test_total_lines_counts_trailing_newline() {
        assert_eq!(SourceIndex::scan("a = 1\n").total_lines(), 2);
        assert_eq!(SourceIndex::scan("").total_lines(), 1);
    }
}
