//! Error types for the planguard evaluation pipeline.
//!
//! Two families exist.  `PlanguardError` is fatal and aborts a run before any
//! result is printed.  `EvalException` is scoped to a single (rule, resource)
//! pair; the reporter records it and keeps evaluating everything else.

use serde::Serialize;
use thiserror::Error;

/// Fatal errors.  Any of these stops the run with a non-zero exit.
#[derive(Debug, Error)]
pub enum PlanguardError {
    /// The top-level plan document is not well-formed JSON.
    #[error("failed to parse plan: {reason}")]
    PlanParse { reason: String },

    /// A rule file or command-line setting is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A file could not be read.
    #[error("failed to read '{path}': {reason}")]
    Io { path: String, reason: String },
}

/// Convenience alias used throughout the planguard crates.
pub type PlanguardResult<T> = Result<T, PlanguardError>;

/// A failure while evaluating one rule against one resource.
///
/// These never abort the run.  They are surfaced next to violations so that
/// a malformed resource is visible instead of silently passing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvalException {
    /// A mapping has no entry for the requested key.
    #[error("field '{segment}' not found while resolving '{path}'")]
    MissingField { path: String, segment: String },

    /// A sequence index is past the end of the sequence.
    #[error("index {index} out of range while resolving '{path}'")]
    IndexOutOfRange { path: String, index: usize },

    /// The path tried to step into a scalar, or used a non-numeric index on a
    /// sequence.
    #[error("cannot resolve '{segment}' inside a {kind} while resolving '{path}'")]
    NotTraversable {
        path: String,
        segment: String,
        #[serde(rename = "node_kind")]
        kind: &'static str,
    },

    /// The path tried to step into an embedded document that did not decode.
    #[error("embedded document is not valid JSON while resolving '{path}'")]
    Undecoded { path: String },

    /// `exists` was pointed at something other than a sequence.
    #[error("'{path}' is a {kind}, expected a sequence")]
    NotASequence {
        path: String,
        #[serde(rename = "node_kind")]
        kind: &'static str,
    },

    /// A wildcard pattern failed to compile.
    #[error("invalid wildcard pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A message template is malformed.
    #[error("invalid message template: {reason}")]
    Template { reason: String },
}
