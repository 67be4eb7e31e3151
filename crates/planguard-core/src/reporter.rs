//! The planguard reporter: runs every selected rule against every matching
//! resource and aggregates the outcomes.
//!
//! Ordering model:
//!
//!   rule set (selection order) → rule (declaration order) → resource (plan order)
//!
//! The (rule, resource) pairs are independent: the document is immutable and
//! rules are read-only, so the pairs are evaluated on the rayon pool.  The
//! job list is built in the order above and `collect` keeps that order, so
//! the join is the only synchronization and the output is deterministic.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use planguard_contracts::{
    document::{Document, Resource},
    error::EvalException,
    report::{Exception, Report, Violation},
    rule::{Rule, RuleSet, Severity},
};

use crate::{
    scope::Scope,
    template,
    traits::{ConditionEvaluator, ResourceMatcher},
};

/// Aggregates evaluator results into a `Report`.
///
/// Owns the matcher and evaluator; construct one per process and call
/// `report` once per loaded plan.
pub struct Reporter {
    matcher: Box<dyn ResourceMatcher>,
    evaluator: Box<dyn ConditionEvaluator>,
}

struct Job<'a, 'd> {
    namespace: &'a str,
    rule: &'a Rule,
    resource: Resource<'d>,
}

enum Outcome {
    Pass,
    Violation(Violation),
    Warning(Violation),
    Exception(Exception),
}

impl Reporter {
    pub fn new(matcher: Box<dyn ResourceMatcher>, evaluator: Box<dyn ConditionEvaluator>) -> Self {
        Self { matcher, evaluator }
    }

    /// Evaluate `rule_sets` against `document`.
    ///
    /// Never fails as a whole.  A (rule, resource) pair whose condition or
    /// message cannot be resolved becomes an `Exception` entry and the rest
    /// of the run is unaffected.
    pub fn report(&self, rule_sets: &[RuleSet], document: &Document) -> Report {
        let jobs: Vec<Job<'_, '_>> = rule_sets
            .iter()
            .flat_map(move |set| {
                set.rules.iter().flat_map(move |rule| {
                    self.matcher
                        .matching(document, &rule.target_resource_type)
                        .map(move |resource| Job {
                            namespace: &set.namespace,
                            rule,
                            resource,
                        })
                })
            })
            .collect();

        debug!(jobs = jobs.len(), rule_sets = rule_sets.len(), "evaluating rules");

        let outcomes: Vec<Outcome> = jobs.par_iter().map(|job| self.run(job)).collect();

        let mut report = Report {
            tests: jobs.len(),
            ..Report::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Pass => {}
                Outcome::Violation(v) => report.violations.push(v),
                Outcome::Warning(v) => report.warnings.push(v),
                Outcome::Exception(e) => report.exceptions.push(e),
            }
        }

        info!(
            tests = report.tests,
            failures = report.violations.len(),
            warnings = report.warnings.len(),
            exceptions = report.exceptions.len(),
            passed = report.passed(),
            "evaluation complete"
        );
        report
    }

    fn run(&self, job: &Job<'_, '_>) -> Outcome {
        let rule = job.rule;
        let bindings = match self.evaluator.evaluate(&job.resource, &rule.condition) {
            Ok(Some(bindings)) => bindings,
            Ok(None) => return Outcome::Pass,
            Err(error) => return exception(job, error),
        };

        let scope = Scope::with_bindings(&job.resource, bindings);
        let message = match template::render(&rule.message_template, &scope) {
            Ok(message) => message,
            Err(error) => return exception(job, error),
        };

        debug!(
            rule = %rule.name,
            resource = %job.resource.identity,
            %message,
            "rule matched"
        );

        let violation = Violation {
            rule_name: rule.name.clone(),
            namespace: job.namespace.to_string(),
            resource: job.resource.identity.clone(),
            address: job.resource.address().map(str::to_string),
            message,
        };
        match rule.severity {
            Severity::Deny => Outcome::Violation(violation),
            Severity::Warn => Outcome::Warning(violation),
        }
    }
}

fn exception(job: &Job<'_, '_>, error: EvalException) -> Outcome {
    warn!(
        rule = %job.rule.name,
        resource = %job.resource.identity,
        %error,
        "rule could not be evaluated"
    );
    Outcome::Exception(Exception {
        rule_name: job.rule.name.clone(),
        namespace: job.namespace.to_string(),
        resource: job.resource.identity.clone(),
        address: job.resource.address().map(str::to_string),
        error,
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────
