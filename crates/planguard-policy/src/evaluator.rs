//! Predicate evaluator.
//!
//! `PredicateEvaluator` implements the `ConditionEvaluator` trait from
//! planguard-core.
//!
//! Evaluation algorithm:
//!
//! 1. `equals` / `in`: resolve the path, normalize both sides when the field
//!    shape is a principal shape, compare.
//! 2. `wildcard_match`: the value is the `*` token, or (for any other
//!    pattern) some string in the value matches the glob.
//! 3. `exists`: walk the sequence in declaration order with the variable
//!    bound; the first satisfying element wins and its bindings are kept.
//!    Elements that raise are skipped, and the first such exception is
//!    reported only if nothing satisfied.
//! 4. `and`: every child in order, stopping at the first that does not hold.

use globset::{Glob, GlobMatcher};
use tracing::trace;

use planguard_contracts::{
    document::{Node, Resource},
    error::EvalException,
    rule::{Condition, FieldShape},
};
use planguard_core::{
    scope::{Bindings, Scope},
    traits::ConditionEvaluator,
};

use crate::principal::{self, Principals, WILDCARD};

/// The condition evaluator used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateEvaluator;

impl ConditionEvaluator for PredicateEvaluator {
    fn evaluate<'d>(
        &self,
        resource: &Resource<'d>,
        condition: &Condition,
    ) -> Result<Option<Bindings<'d>>, EvalException> {
        let mut scope = Scope::new(resource);
        if holds(condition, &mut scope)? {
            Ok(Some(scope.into_bindings()))
        } else {
            Ok(None)
        }
    }
}

fn holds<'d>(condition: &Condition, scope: &mut Scope<'_, 'd>) -> Result<bool, EvalException> {
    match condition {
        Condition::Equals { path, value, shape } => {
            let found = scope.resolve(path)?;
            Ok(equals(found, &Node::from(value), *shape))
        }

        Condition::In { path, values, shape } => {
            let found = scope.resolve(path)?;
            Ok(values.iter().any(|v| equals(found, &Node::from(v), *shape)))
        }

        Condition::WildcardMatch { path, pattern, shape } => {
            let found = scope.resolve(path)?;
            wildcard_match(found, pattern, *shape)
        }

        Condition::Exists {
            collection,
            bind,
            condition,
        } => {
            let node = scope.resolve(collection)?;
            let items = node.as_sequence().ok_or_else(|| EvalException::NotASequence {
                path: collection.clone(),
                kind: node.kind(),
            })?;

            let mut first_error = None;
            for (index, item) in items.iter().enumerate() {
                let mark = scope.mark();
                scope.bind(bind, item);
                match holds(condition, scope) {
                    Ok(true) => {
                        trace!(collection = %collection, index, "exists satisfied");
                        return Ok(true);
                    }
                    Ok(false) => scope.rewind(mark),
                    Err(e) => {
                        scope.rewind(mark);
                        first_error.get_or_insert(e);
                    }
                }
            }

            match first_error {
                Some(e) => Err(e),
                None => Ok(false),
            }
        }

        Condition::And(children) => {
            let mark = scope.mark();
            for child in children {
                if !holds(child, scope)? {
                    scope.rewind(mark);
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn equals(found: &Node, literal: &Node, shape: FieldShape) -> bool {
    if shape.is_principal() {
        if let (Some(a), Some(b)) = (
            principal::normalize(found, shape),
            principal::normalize(literal, shape),
        ) {
            return a == b;
        }
    }
    found.same_value(literal)
}

fn wildcard_match(found: &Node, pattern: &str, shape: FieldShape) -> Result<bool, EvalException> {
    if shape.is_principal() {
        return match principal::normalize(found, shape) {
            Some(Principals::Any) => Ok(true),
            Some(Principals::Set(_)) if pattern == WILDCARD => Ok(false),
            Some(Principals::Set(ids)) => {
                let matcher = compile_pattern(pattern)?;
                Ok(ids.iter().any(|id| matcher.is_match(id)))
            }
            None => Ok(false),
        };
    }

    let texts: Vec<&str> = match found {
        Node::Sequence(items) => items.iter().filter_map(Node::as_text).collect(),
        other => other.as_text().into_iter().collect(),
    };
    if texts.contains(&WILDCARD) {
        return Ok(true);
    }
    if pattern == WILDCARD {
        return Ok(false);
    }
    let matcher = compile_pattern(pattern)?;
    Ok(texts.iter().any(|text| matcher.is_match(text)))
}

/// Compile a glob.  `*` matches across `/` and `:` so ARN patterns like
/// `arn:aws:s3:::bucket/*` behave as written.
pub(crate) fn compile_pattern(pattern: &str) -> Result<GlobMatcher, EvalException> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| EvalException::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })
}
