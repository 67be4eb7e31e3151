//! The in-memory plan document model.
//!
//! A loaded plan is a tree of `Node`s.  Once the loader hands back a
//! `Document` the tree is never modified: evaluation only borrows from it,
//! which is what lets the reporter share it across worker threads.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// One value in a plan document.
///
/// Mirrors the JSON data model with one extra leaf, `RawEncoded`, for string
/// values that looked like embedded JSON but could not be decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Mapping(BTreeMap<String, Node>),
    Sequence(Vec<Node>),
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
    /// An embedded document that failed its secondary parse (or sat deeper
    /// than the loader's decode limit).  Traversing into it is an error.
    RawEncoded(String),
}

impl Node {
    /// Short type name used in exception messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::String(_) => "string",
            Node::Number(_) => "number",
            Node::Bool(_) => "bool",
            Node::Null => "null",
            Node::RawEncoded(_) => "undecoded embedded document",
        }
    }

    /// Look up `key` when this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// String payload of a `String` or `RawEncoded` node.  An undecoded
    /// embedded document still compares and matches as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::String(s) | Node::RawEncoded(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Structural equality that compares numbers by value, so an integer
    /// literal from a rule file equals the same number written as `1.0` in a
    /// plan.
    pub fn same_value(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Number(a), Node::Number(b)) => same_number(a, b),
            (Node::Mapping(a), Node::Mapping(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_value(vb))
            }
            (Node::Sequence(a), Node::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_value(y))
            }
            (Node::RawEncoded(a), Node::String(b)) | (Node::String(a), Node::RawEncoded(b)) => a == b,
            _ => self == other,
        }
    }
}

/// Integers compare exactly; `f64` is only used when either side is a float.
fn same_number(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if a.is_f64() || b.is_f64() {
        return match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        };
    }
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.as_u64() == b.as_u64(),
        // One side fits i64 and the other does not: different values.
        _ => false,
    }
}

/// Plain conversion with no embedded-document decoding.  Used for rule
/// literals; plans go through the loader instead.
impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Node::Null,
            serde_json::Value::Bool(b) => Node::Bool(b),
            serde_json::Value::Number(n) => Node::Number(n),
            serde_json::Value::String(s) => Node::String(s),
            serde_json::Value::Array(items) => {
                Node::Sequence(items.into_iter().map(Node::from).collect())
            }
            serde_json::Value::Object(map) => {
                Node::Mapping(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Node {
    fn from(value: &serde_json::Value) -> Self {
        Node::from(value.clone())
    }
}

/// Strings print without quotes; everything else prints as compact JSON.
/// This is the form substituted into violation messages.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::String(s) | Node::RawEncoded(s) => f.write_str(s),
            other => {
                let rendered = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
        }
    }
}

/// A fully loaded, read-only plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,
}

impl Document {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

/// One entry of the plan's planned resource collection.
///
/// `identity` is the entry's position in the collection (for example
/// `planned_values.root_module.resources[0]`) and is unique within a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource<'d> {
    pub identity: String,
    pub node: &'d Node,
}

impl<'d> Resource<'d> {
    pub fn new(identity: impl Into<String>, node: &'d Node) -> Self {
        Self {
            identity: identity.into(),
            node,
        }
    }

    pub fn resource_type(&self) -> Option<&'d str> {
        self.node.get("type").and_then(Node::as_str)
    }

    /// The planning tool's own address for the resource, when it has one.
    pub fn address(&self) -> Option<&'d str> {
        self.node.get("address").and_then(Node::as_str)
    }

    pub fn values(&self) -> Option<&'d Node> {
        self.node.get("values")
    }
}
