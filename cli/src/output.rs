//! Result rendering and exit codes.

use clap::ValueEnum;
use serde::Serialize;

use planguard_contracts::report::{Exception, Report, Summary, Violation};

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per finding, then a summary line.
    Stdout,
    /// A single JSON object.
    Json,
}

/// Exit code when nothing failed.
pub const EXIT_PASSED: i32 = 0;
/// Exit code for violations and fatal errors.
pub const EXIT_FAILED: i32 = 1;
/// Exit code when only warnings or exceptions were found and the caller
/// asked for those to fail the run.
pub const EXIT_STRICT: i32 = 2;

/// Text output: `FAIL`, `WARN`, and `EXCEPTION` lines, then the summary.
pub fn render_text(plan: &str, report: &Report) -> String {
    let mut out = String::new();
    for v in &report.violations {
        out.push_str(&format!("FAIL - {} - {} - {}\n", plan, v.namespace, v.message));
    }
    for v in &report.warnings {
        out.push_str(&format!("WARN - {} - {} - {}\n", plan, v.namespace, v.message));
    }
    for e in &report.exceptions {
        let target = e.address.as_deref().unwrap_or(&e.resource);
        out.push_str(&format!(
            "EXCEPTION - {} - {} - {} on {}: {}\n",
            plan, e.namespace, e.rule_name, target, e.error
        ));
    }
    out.push_str(&summary_line(&report.summary()));
    out.push('\n');
    out
}

pub fn summary_line(s: &Summary) -> String {
    format!(
        "{} tests, {} passed, {} warnings, {} failures, {} exceptions",
        s.tests, s.passed, s.warnings, s.failures, s.exceptions
    )
}

#[derive(Serialize)]
struct JsonReport<'a> {
    filename: &'a str,
    passed: bool,
    summary: Summary,
    failures: &'a [Violation],
    warnings: &'a [Violation],
    exceptions: &'a [Exception],
}

/// JSON output: one pretty-printed object.
pub fn render_json(plan: &str, report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        filename: plan,
        passed: report.passed(),
        summary: report.summary(),
        failures: &report.violations,
        warnings: &report.warnings,
        exceptions: &report.exceptions,
    })
}

/// Process exit code for a finished run.
pub fn exit_code(report: &Report, fail_on_warn: bool, fail_on_exception: bool) -> i32 {
    if !report.passed() {
        EXIT_FAILED
    } else if (fail_on_warn && !report.warnings.is_empty())
        || (fail_on_exception && !report.exceptions.is_empty())
    {
        EXIT_STRICT
    } else {
        EXIT_PASSED
    }
}
