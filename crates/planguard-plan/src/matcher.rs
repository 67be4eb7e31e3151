//! Planned resource matcher.
//!
//! Resources live at `planned_values.root_module.resources`.  Modules nest
//! under `child_modules`; each module's own resources come first, then its
//! children depth-first, all in declaration order.

use std::iter::Enumerate;
use std::slice;

use tracing::debug;

use planguard_contracts::document::{Document, Node, Resource};
use planguard_core::traits::ResourceMatcher;

/// Dotted path of the root module inside a plan.
pub const ROOT_MODULE_PATH: &str = "planned_values.root_module";

/// A `ResourceMatcher` over a plan's planned values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlannedResourceMatcher;

impl ResourceMatcher for PlannedResourceMatcher {
    fn matching<'d>(
        &self,
        document: &'d Document,
        resource_type: &str,
    ) -> Box<dyn Iterator<Item = Resource<'d>> + Send + 'd> {
        Box::new(PlannedResources::new(document, resource_type))
    }
}

/// Lazy walk over the planned resources of one type.
pub struct PlannedResources<'d> {
    resource_type: String,
    stack: Vec<ModuleFrame<'d>>,
}

struct ModuleFrame<'d> {
    path: String,
    resources: Enumerate<slice::Iter<'d, Node>>,
    children: &'d [Node],
}

impl<'d> ModuleFrame<'d> {
    fn new(path: String, module: &'d Node) -> Self {
        let list = |key: &str| module.get(key).and_then(Node::as_sequence).unwrap_or(&[]);
        Self {
            path,
            resources: list("resources").iter().enumerate(),
            children: list("child_modules"),
        }
    }
}

impl<'d> PlannedResources<'d> {
    pub fn new(document: &'d Document, resource_type: &str) -> Self {
        let root = document
            .root()
            .get("planned_values")
            .and_then(|planned| planned.get("root_module"));

        let stack = match root {
            Some(module) => vec![ModuleFrame::new(ROOT_MODULE_PATH.to_string(), module)],
            None => {
                debug!(path = ROOT_MODULE_PATH, "plan has no planned root module");
                Vec::new()
            }
        };

        Self {
            resource_type: resource_type.to_string(),
            stack,
        }
    }
}

impl<'d> Iterator for PlannedResources<'d> {
    type Item = Resource<'d>;

    fn next(&mut self) -> Option<Resource<'d>> {
        loop {
            let frame = self.stack.last_mut()?;
            if let Some((index, node)) = frame.resources.next() {
                if node.get("type").and_then(Node::as_str) == Some(self.resource_type.as_str()) {
                    let identity = format!("{}.resources[{}]", frame.path, index);
                    return Some(Resource::new(identity, node));
                }
                continue;
            }

            // Module exhausted; descend into its children, first child on top.
            let done = self.stack.pop()?;
            for (index, child) in done.children.iter().enumerate().rev() {
                let path = format!("{}.child_modules[{}]", done.path, index);
                self.stack.push(ModuleFrame::new(path, child));
            }
        }
    }
}
