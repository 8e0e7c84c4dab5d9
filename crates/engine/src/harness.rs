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

//! Reproduction harness generation.
//!
//! The generated pytest module re-executes the analysed program with the
//! checker's nondeterministic primitives replaced by bounded random values,
//! and turns any runtime error into a test failure.

use bmctrace_common::types::VariableSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised while generating a harness
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The lower bound of the nondeterministic integer range exceeds the upper bound
    #[error("invalid nondet_int range: min {min} is greater than max {max}")]
    InvalidRange {
        /// Configured lower bound
        min: i64,
        /// Configured upper bound
        max: i64,
    },

    /// The seed values could not be serialized
    #[error("failed to serialize seed values: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Value ranges for the mocked nondeterministic primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Lowest value `nondet_int()` may return
    pub nondet_int_min: i64,
    /// Highest value `nondet_int()` may return
    pub nondet_int_max: i64,
    /// Highest value `nondet_uint()` may return
    pub nondet_uint_max: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self { nondet_int_min: -100, nondet_int_max: 100, nondet_uint_max: 100 }
    }
}

/// Renders pytest reproduction scripts
#[derive(Debug, Clone, Default)]
pub struct HarnessGenerator {
    config: HarnessConfig,
}

impl HarnessGenerator {
    /// Create a generator using `config`
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Configured ranges
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Render a pytest module executing `source`.
    ///
    /// `seed` is embedded as `SEED_CONTEXT`, each value decoded as a Python
    /// literal where possible and kept as a string otherwise.
    pub fn render(&self, source: &str, seed: &VariableSnapshot) -> Result<String, HarnessError> {
        let HarnessConfig { nondet_int_min, nondet_int_max, nondet_uint_max } = self.config;
        if nondet_int_min > nondet_int_max {
            return Err(HarnessError::InvalidRange { min: nondet_int_min, max: nondet_int_max });
        }

        // A JSON string literal is also a valid Python string literal
        let seed_literal = serde_json::to_string(&serde_json::to_string(seed)?)?;
        let escaped_source = escape_source(source);
        debug!(seed_variables = seed.len(), source_bytes = source.len(), "Rendering harness");

        Ok(format!(
            r#"import ast
import json
import math
import random

import pytest

SEED_CONTEXT_RAW = json.loads({seed_literal})


def _decode(value):
    try:
        return ast.literal_eval(value)
    except (ValueError, SyntaxError):
        return value


SEED_CONTEXT = {{name: _decode(value) for name, value in SEED_CONTEXT_RAW.items()}}


def mock_nondet_int():
    return random.randint({nondet_int_min}, {nondet_int_max})


def mock_nondet_uint():
    return random.randint(0, {nondet_uint_max})


def mock_assume(cond):
    pass


def mock_cover(cond):
    pass


mock_globals = {{
    "math": math,
    "pytest": pytest,
    "random": random,
    "nondet_int": mock_nondet_int,
    "nondet_uint": mock_nondet_uint,
    "__ESBMC_assume": mock_assume,
    "__ESBMC_cover": mock_cover,
}}


def test_counterexample_scenario():
    print("\n--- Controlled execution ---")
    print("Counterexample values:", SEED_CONTEXT)
    source = '''
{escaped_source}
'''
    try:
        exec(source, mock_globals)
    except AssertionError as e:
        pytest.fail(f"Assertion failed: {{e}}")
    except ZeroDivisionError:
        pytest.fail("Division by zero!")
    except TypeError as e:
        pytest.fail(f"Type error: {{e}}")
    except IndexError as e:
        pytest.fail(f"Index error: {{e}}")
    except NameError as e:
        pytest.fail(f"Name error: {{e}}")
    except Exception as e:
        pytest.fail(f"Error: {{type(e).__name__}}: {{e}}")
"#
        ))
    }
}

/// Escape `source` for embedding in a triple-single-quoted Python string
fn escape_source(source: &str) -> String {
    source.replace('\\', r"\\").replace("'''", r"\'\'\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_source() {
        assert_eq!(escape_source("s = '''x'''"), r"s = \'\'\'x\'\'\'");
        assert_eq!(escape_source(r#"print("a\nb")"#), r#"print("a\\nb")"#);
    }

    #[test]
    fn test_render_embeds_ranges_and_seed() {
        let mut seed = VariableSnapshot::new();
        seed.insert("b".to_string(), "3".to_string());

        let config = HarnessConfig { nondet_int_min: -7, nondet_int_max: 9, nondet_uint_max: 42 };
        let script = HarnessGenerator::new(config).render("b = 3\nassert b > 5", &seed).unwrap();

        assert!(script.contains("random.randint(-7, 9)"));
        assert!(script.contains("random.randint(0, 42)"));
        assert!(script.contains(r#"SEED_CONTEXT_RAW = json.loads("{\"b\":\"3\"}")"#));
        assert!(script.contains("assert b > 5"));
        assert!(script.contains("\"__ESBMC_assume\": mock_assume"));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let config = HarnessConfig { nondet_int_min: 5, nondet_int_max: -5, ..Default::default() };
        let err = HarnessGenerator::new(config).render("", &VariableSnapshot::new()).unwrap_err();

        assert!(matches!(err, HarnessError::InvalidRange { min: 5, max: -5 }));
        assert!(err.to_string().contains("greater than"));
    }

    #[test]
    fn test_config_defaults() {
        let config: HarnessConfig = serde_json::from_str(r#"{"nondet_uint_max": 7}"#).unwrap();
        assert_eq!(config.nondet_int_min, -100);
        assert_eq!(config.nondet_int_max, 100);
        assert_eq!(config.nondet_uint_max, 7);
    }
}
