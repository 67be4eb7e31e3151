//! JSON plan loader.
//!
//! Planning tools serialize some attributes (bucket policies, IAM documents,
//! container definitions) as JSON text inside a string.  The loader decodes
//! those in place so rules can walk into them like any other structure.
//!
//! A string is a decode candidate when its first non-whitespace character is
//! `{` or `[`; attribute names play no part.  A candidate that fails to parse,
//! or that sits deeper than `max_embedded_depth` levels of embedding, is kept
//! as `Node::RawEncoded`.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use planguard_contracts::{
    document::{Document, Node},
    error::{PlanguardError, PlanguardResult},
};
use planguard_core::traits::PlanLoader;

/// Embedding levels decoded by default.
pub const DEFAULT_MAX_EMBEDDED_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// How many levels of JSON-inside-a-string are decoded.  `0` disables
    /// embedded decoding entirely.
    pub max_embedded_depth: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_embedded_depth: DEFAULT_MAX_EMBEDDED_DEPTH,
        }
    }
}

/// A `PlanLoader` for JSON plan documents.
#[derive(Debug, Clone, Default)]
pub struct JsonPlanLoader {
    options: LoaderOptions,
}

impl JsonPlanLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Read the file at `path` and load it as a plan.
    ///
    /// Returns `PlanguardError::Io` if the file cannot be read, and
    /// `PlanguardError::PlanParse` if it is not well-formed JSON.
    pub fn load_file(&self, path: &Path) -> PlanguardResult<Document> {
        let raw = std::fs::read(path).map_err(|e| PlanguardError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.load(&raw)
    }

    fn decode(&self, value: Value, depth: usize) -> Node {
        match value {
            Value::String(s) => self.decode_string(s, depth),
            Value::Array(items) => {
                Node::Sequence(items.into_iter().map(|v| self.decode(v, depth)).collect())
            }
            Value::Object(map) => Node::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, self.decode(v, depth)))
                    .collect(),
            ),
            scalar => Node::from(scalar),
        }
    }

    fn decode_string(&self, s: String, depth: usize) -> Node {
        if !looks_embedded(&s) {
            return Node::String(s);
        }
        if depth >= self.options.max_embedded_depth {
            warn!(
                depth,
                limit = self.options.max_embedded_depth,
                "embedded document exceeds decode depth; keeping it undecoded"
            );
            return Node::RawEncoded(s);
        }
        match serde_json::from_str::<Value>(&s) {
            Ok(inner) => self.decode(inner, depth + 1),
            Err(e) => {
                debug!(error = %e, "string looks like embedded JSON but does not parse");
                Node::RawEncoded(s)
            }
        }
    }
}

impl PlanLoader for JsonPlanLoader {
    fn load(&self, raw: &[u8]) -> PlanguardResult<Document> {
        let value: Value = serde_json::from_slice(raw).map_err(|e| PlanguardError::PlanParse {
            reason: e.to_string(),
        })?;
        let document = Document::new(self.decode(value, 0));
        debug!(bytes = raw.len(), root = document.root().kind(), "plan loaded");
        Ok(document)
    }
}

fn looks_embedded(s: &str) -> bool {
    matches!(s.trim_start().as_bytes().first(), Some(b'{' | b'['))
}
