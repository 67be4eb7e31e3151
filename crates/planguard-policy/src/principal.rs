//! Principal normalization.
//!
//! A principal field arrives in one of several JSON shapes:
//!
//! ```text
//! "*"
//! "arn:aws:iam::123:root"
//! {"AWS": "arn:aws:iam::123:root"}
//! {"AWS": ["arn:aws:iam::123:root", "arn:aws:iam::456:root"], "Service": "s3.amazonaws.com"}
//! ```
//!
//! `normalize` turns every shape into a `Principals` value so comparisons
//! never depend on which representation the author chose.

use std::collections::BTreeSet;

use planguard_contracts::{document::Node, rule::FieldShape};

/// The token that grants access to everyone.
pub const WILDCARD: &str = "*";

/// Canonical form of a principal field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principals {
    /// Everyone.
    Any,
    /// These identifiers, regardless of the key they were listed under.
    Set(BTreeSet<String>),
}

/// Normalize `node` under `shape`.
///
/// Returns `None` when the node is not a principal in any recognised shape
/// (a number, a nested object, a list holding non-strings, ...).
///
/// Only a bare `"*"` string is `Any` under `FieldShape::Principal`.  Under
/// `FieldShape::PrincipalNested`, a `"*"` entry inside an object or a list is
/// `Any` too.
pub fn normalize(node: &Node, shape: FieldShape) -> Option<Principals> {
    let mut ids = BTreeSet::new();
    match node {
        Node::String(s) if s == WILDCARD => return Some(Principals::Any),
        Node::String(s) => {
            ids.insert(s.clone());
        }
        Node::Sequence(items) => collect(items, &mut ids)?,
        Node::Mapping(map) => {
            for value in map.values() {
                match value {
                    Node::String(s) => {
                        ids.insert(s.clone());
                    }
                    Node::Sequence(items) => collect(items, &mut ids)?,
                    _ => return None,
                }
            }
        }
        _ => return None,
    }

    if shape == FieldShape::PrincipalNested && ids.contains(WILDCARD) {
        Some(Principals::Any)
    } else {
        Some(Principals::Set(ids))
    }
}

fn collect(items: &[Node], ids: &mut BTreeSet<String>) -> Option<()> {
    for item in items {
        ids.insert(item.as_str()?.to_string());
    }
    Some(())
}
