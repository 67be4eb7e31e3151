//! Variable scope and path resolution.
//!
//! Condition paths and message placeholders share one resolution scheme.  The
//! first dot-separated segment picks the root:
//!
//! 1. a variable bound by an enclosing `exists` (innermost binding wins),
//! 2. `resource`, the resource entry itself,
//! 3. otherwise the resource's `values` mapping, with the segment kept.
//!
//! Remaining segments index mappings by key and sequences by decimal index.

use planguard_contracts::{
    document::{Node, Resource},
    error::EvalException,
};

/// Name of the root that addresses the resource entry instead of its values.
pub const RESOURCE_ROOT: &str = "resource";

/// Variables bound during one evaluation, in binding order.
pub type Bindings<'d> = Vec<(String, &'d Node)>;

/// The evaluation view of one resource plus the variables currently bound.
#[derive(Debug, Clone)]
pub struct Scope<'r, 'd> {
    resource: &'r Resource<'d>,
    bindings: Bindings<'d>,
}

impl<'r, 'd> Scope<'r, 'd> {
    pub fn new(resource: &'r Resource<'d>) -> Self {
        Self::with_bindings(resource, Vec::new())
    }

    pub fn with_bindings(resource: &'r Resource<'d>, bindings: Bindings<'d>) -> Self {
        Self { resource, bindings }
    }

    pub fn resource(&self) -> &'r Resource<'d> {
        self.resource
    }

    /// Bind `name` to `node`, shadowing any earlier binding of the same name.
    pub fn bind(&mut self, name: &str, node: &'d Node) {
        self.bindings.push((name.to_string(), node));
    }

    /// Current binding depth, for a later `rewind`.
    pub fn mark(&self) -> usize {
        self.bindings.len()
    }

    /// Drop every binding made after `mark`.
    pub fn rewind(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }

    pub fn bindings(&self) -> &Bindings<'d> {
        &self.bindings
    }

    pub fn into_bindings(self) -> Bindings<'d> {
        self.bindings
    }

    fn lookup(&self, name: &str) -> Option<&'d Node> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, node)| *node)
    }

    /// Resolve a dot-separated `path` to the node it names.
    pub fn resolve(&self, path: &str) -> Result<&'d Node, EvalException> {
        let segments: Vec<&str> = path.split('.').collect();

        let (mut current, rest) = match self.lookup(segments[0]) {
            Some(bound) => (bound, &segments[1..]),
            None if segments[0] == RESOURCE_ROOT => (self.resource.node, &segments[1..]),
            None => {
                let values = self
                    .resource
                    .values()
                    .ok_or_else(|| EvalException::MissingField {
                        path: path.to_string(),
                        segment: "values".to_string(),
                    })?;
                (values, &segments[..])
            }
        };

        for segment in rest {
            current = step(current, segment, path)?;
        }
        Ok(current)
    }
}

fn step<'d>(node: &'d Node, segment: &str, path: &str) -> Result<&'d Node, EvalException> {
    match node {
        Node::Mapping(map) => map.get(segment).ok_or_else(|| EvalException::MissingField {
            path: path.to_string(),
            segment: segment.to_string(),
        }),
        Node::Sequence(items) => {
            let index: usize = segment.parse().map_err(|_| EvalException::NotTraversable {
                path: path.to_string(),
                segment: segment.to_string(),
                kind: node.kind(),
            })?;
            items.get(index).ok_or_else(|| EvalException::IndexOutOfRange {
                path: path.to_string(),
                index,
            })
        }
        Node::RawEncoded(_) => Err(EvalException::Undecoded {
            path: path.to_string(),
        }),
        other => Err(EvalException::NotTraversable {
            path: path.to_string(),
            segment: segment.to_string(),
            kind: other.kind(),
        }),
    }
}
