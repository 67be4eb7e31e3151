//! Evaluation results.
//!
//! The reporter produces one `Report` per run.  Whether the run passed is
//! derived from the violation list and never stored on its own.

use serde::Serialize;

use crate::error::EvalException;

/// A rule whose condition held against a resource.
///
/// The same type carries both deny-severity violations and warn-severity
/// warnings; the `Report` list it lives in tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule_name: String,
    pub namespace: String,
    /// Positional identity of the resource within the plan.
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub message: String,
}

/// A (rule, resource) pair that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exception {
    pub rule_name: String,
    pub namespace: String,
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub error: EvalException,
}

/// Aggregated outcome of one run, ordered by rule set, then rule, then
/// resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
    pub exceptions: Vec<Exception>,
    /// Number of (rule, resource) evaluations performed.
    pub tests: usize,
}

impl Report {
    /// True only when there are no violations.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn summary(&self) -> Summary {
        let failures = self.violations.len();
        let warnings = self.warnings.len();
        let exceptions = self.exceptions.len();
        Summary {
            tests: self.tests,
            passed: self
                .tests
                .saturating_sub(failures + warnings + exceptions),
            warnings,
            failures,
            exceptions,
        }
    }
}

/// Counts printed in the summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub tests: usize,
    pub passed: usize,
    pub warnings: usize,
    pub failures: usize,
    pub exceptions: usize,
}
