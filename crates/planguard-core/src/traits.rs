//! Core trait definitions for the planguard pipeline.
//!
//! These three traits are the seams between the crates:
//!
//! - `PlanLoader`         turns raw bytes into an immutable `Document`
//! - `ResourceMatcher`    selects candidate resources by type
//! - `ConditionEvaluator` tests one condition tree against one resource
//!
//! The `Reporter` wires a matcher and an evaluator together.  Loading happens
//! before the reporter runs; nothing inside evaluation performs I/O.

use planguard_contracts::{
    document::{Document, Resource},
    error::{EvalException, PlanguardResult},
    rule::Condition,
};

use crate::scope::Bindings;

/// Parses a raw plan into a `Document`.
pub trait PlanLoader: Send + Sync {
    /// Parse `raw` into a fully materialized document.
    ///
    /// Fails with `PlanguardError::PlanParse` when the top-level input is not
    /// well-formed.  Never returns a partially built tree.
    fn load(&self, raw: &[u8]) -> PlanguardResult<Document>;
}

/// Selects resources of one type from a loaded plan.
pub trait ResourceMatcher: Send + Sync {
    /// Return the resources whose `type` equals `resource_type`, in plan
    /// declaration order.
    ///
    /// The iterator is lazy.  Calling `matching` again restarts from the
    /// beginning; no state is consumed between calls.
    fn matching<'d>(
        &self,
        document: &'d Document,
        resource_type: &str,
    ) -> Box<dyn Iterator<Item = Resource<'d>> + Send + 'd>;
}

/// Evaluates a condition tree against a single resource.
///
/// Implementations must be deterministic: the same resource and condition
/// always produce the same bindings, so rendered messages are reproducible.
pub trait ConditionEvaluator: Send + Sync {
    /// Returns `Ok(Some(bindings))` when the condition holds, with the
    /// variables bound by the winning branch, `Ok(None)` when it does not,
    /// and `Err` when a path cannot be resolved.
    fn evaluate<'d>(
        &self,
        resource: &Resource<'d>,
        condition: &Condition,
    ) -> Result<Option<Bindings<'d>>, EvalException>;
}
