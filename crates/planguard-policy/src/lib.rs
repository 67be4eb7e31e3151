//! # planguard-policy
//!
//! TOML rule files and predicate evaluation for planguard.
//!
//! ## Overview
//!
//! This crate provides [`PolicyRegistry`], which loads rule files and groups
//! them by namespace, and [`PredicateEvaluator`], which implements the
//! [`ConditionEvaluator`](planguard_core::traits::ConditionEvaluator) trait.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use planguard_policy::{NamespaceSelection, PolicyRegistry, PredicateEvaluator};
//!
//! let registry = PolicyRegistry::from_dir(Path::new("policy"))?;
//! let rule_sets = registry.select(&NamespaceSelection::Default);
//! // Pass `PredicateEvaluator` to `planguard_core::Reporter::new(...)`.
//! ```
//!
//! ## Conditions
//!
//! `equals`, `in`, `wildcard_match`, `exists`, and `and`.  Principal fields
//! take a `shape` so that `"arn:..."` and `{"AWS": "arn:..."}` compare equal.

pub mod evaluator;
pub mod principal;
pub mod registry;

pub use evaluator::PredicateEvaluator;
pub use principal::Principals;
pub use registry::{NamespaceSelection, PolicyRegistry, DEFAULT_NAMESPACE};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use serde_json::json;

    use planguard_contracts::{error::PlanguardError, rule::Severity};
    use planguard_core::{traits::PlanLoader, Reporter};
    use planguard_plan::{JsonPlanLoader, PlannedResourceMatcher};

    use crate::{NamespaceSelection, PolicyRegistry, PredicateEvaluator};

    // ── Helpers ───────────────────────────────────────────────────────────────

    const PUBLIC_ACCESS: &str = r#"
        [[rules]]
        name = "public"
        resource_type = "aws_s3_bucket_policy"
        message = "Bucket policy allows public access: {statement.Resource}"

        [rules.condition.exists]
        collection = "policy.Statement"
        bind = "statement"

        [[rules.condition.exists.condition.and]]
        equals = { path = "statement.Effect", value = "Allow" }

        [[rules.condition.exists.condition.and]]
        wildcard_match = { path = "statement.Principal", pattern = "*", shape = "principal" }
    "#;

    fn bundled_policy_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../policy")
    }

    fn config_error(result: Result<PolicyRegistry, PlanguardError>) -> String {
        match result {
            Err(PlanguardError::ConfigError { reason }) => reason,
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    /// A plan with a single bucket policy whose `policy` attribute is the
    /// JSON-encoded form of `policy`, as planning tools emit it.
    fn plan_with_policy(policy: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "format_version": "1.2",
            "planned_values": { "root_module": { "resources": [{
                "address": "aws_s3_bucket_policy.site",
                "type": "aws_s3_bucket_policy",
                "name": "site",
                "values": { "bucket": "site", "policy": policy.to_string() }
            }] } }
        }))
        .unwrap()
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    #[test]
    fn namespace_defaults_to_main() {
        let registry = PolicyRegistry::from_toml_str(PUBLIC_ACCESS).unwrap();
        assert_eq!(registry.namespaces().collect::<Vec<_>>(), vec!["main"]);
        assert_eq!(registry.rule_count(), 1);

        let sets = registry.select(&NamespaceSelection::Default);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].rules[0].severity, Severity::Deny);
    }

    #[test]
    fn files_sharing_a_namespace_are_appended() {
        let mut registry = PolicyRegistry::new();
        registry.add_toml_str(PUBLIC_ACCESS, "a.toml").unwrap();
        registry
            .add_toml_str(
                r#"
                [[rules]]
                name = "second"
                resource_type = "aws_s3_bucket_acl"
                message = "acl"
                condition = { equals = { path = "acl", value = "public-read" } }
                "#,
                "b.toml",
            )
            .unwrap();

        let sets = registry.select(&NamespaceSelection::Default);
        let names: Vec<&str> = sets[0].rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["public", "second"]);
    }

    #[test]
    fn duplicate_rule_names_are_rejected() {
        let mut registry = PolicyRegistry::new();
        registry.add_toml_str(PUBLIC_ACCESS, "a.toml").unwrap();
        let err = registry.add_toml_str(PUBLIC_ACCESS, "b.toml").unwrap_err();
        assert!(err.to_string().contains("already defined"), "got: {err}");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let reason = config_error(PolicyRegistry::from_toml_str("this is not valid toml ][[["));
        assert!(reason.contains("failed to parse rule file"), "got: {reason}");
    }

    #[test]
    fn invalid_glob_is_rejected_at_load() {
        let reason = config_error(PolicyRegistry::from_toml_str(
            r#"
            [[rules]]
            name = "bad-glob"
            resource_type = "aws_iam_policy"
            message = "x"
            condition = { wildcard_match = { path = "arn", pattern = "arn:[" } }
            "#,
        ));
        assert!(reason.contains("bad-glob"), "got: {reason}");
        assert!(reason.contains("invalid wildcard pattern"), "got: {reason}");
    }

    #[test]
    fn reserved_and_malformed_bindings_are_rejected() {
        for bind in ["resource", "a.b", ""] {
            let toml = format!(
                r#"
                [[rules]]
                name = "bind"
                resource_type = "t"
                message = "x"
                condition = {{ exists = {{ collection = "items", bind = "{bind}", condition = {{ and = [] }} }} }}
                "#
            );
            config_error(PolicyRegistry::from_toml_str(&toml));
        }
    }

    #[test]
    fn malformed_message_template_is_rejected() {
        let reason = config_error(PolicyRegistry::from_toml_str(
            r#"
            [[rules]]
            name = "bad-message"
            resource_type = "t"
            message = "unclosed {statement.Resource"
            condition = { equals = { path = "x", value = 1 } }
            "#,
        ));
        assert!(reason.contains("invalid message template"), "got: {reason}");
    }

    #[test]
    fn empty_path_segments_are_rejected() {
        config_error(PolicyRegistry::from_toml_str(
            r#"
            [[rules]]
            name = "bad-path"
            resource_type = "t"
            message = "x"
            condition = { equals = { path = "policy..Statement", value = 1 } }
            "#,
        ));
    }

    #[test]
    fn padded_path_segments_are_rejected() {
        let reason = config_error(PolicyRegistry::from_toml_str(
            r#"
            [[rules]]
            name = "padded-path"
            resource_type = "t"
            message = "x"
            condition = { equals = { path = "policy. Statement", value = 1 } }
            "#,
        ));
        assert!(reason.contains("invalid path 'policy. Statement'"), "got: {reason}");
    }

    #[test]
    fn misspelled_rule_key_is_a_config_error() {
        let reason = config_error(PolicyRegistry::from_toml_str(
            r#"
            [[rules]]
            name = "typo"
            resource_type = "aws_s3_bucket_acl"
            severty = "warn"
            message = "x"
            condition = { equals = { path = "acl", value = "public-read" } }
            "#,
        ));
        assert!(reason.contains("severty"), "got: {reason}");
    }

    // ── Selection ─────────────────────────────────────────────────────────────

    #[test]
    fn selection_modes() {
        let mut registry = PolicyRegistry::new();
        for ns in ["zeta", "main", "alpha"] {
            let toml = format!(
                r#"
                namespace = "{ns}"
                [[rules]]
                name = "{ns}-rule"
                resource_type = "t"
                message = "x"
                condition = {{ equals = {{ path = "x", value = 1 }} }}
                "#
            );
            registry.add_toml_str(&toml, ns).unwrap();
        }

        let namespaces = |selection: NamespaceSelection| -> Vec<String> {
            registry.select(&selection).into_iter().map(|s| s.namespace).collect()
        };

        assert_eq!(namespaces(NamespaceSelection::Default), vec!["main"]);
        assert_eq!(namespaces(NamespaceSelection::All), vec!["alpha", "main", "zeta"]);
        assert_eq!(
            namespaces(NamespaceSelection::Named(vec![
                "zeta".to_string(),
                "missing".to_string(),
                "zeta".to_string(),
                "alpha".to_string(),
            ])),
            vec!["zeta", "alpha"]
        );
    }

    // ── Directory loading ─────────────────────────────────────────────────────

    #[test]
    fn from_dir_walks_recursively_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.toml"), PUBLIC_ACCESS.replace("\"public\"", "\"b\"")).unwrap();
        std::fs::write(dir.path().join("a.toml"), PUBLIC_ACCESS.replace("\"public\"", "\"a\"")).unwrap();
        std::fs::write(
            dir.path().join("nested/c.toml"),
            PUBLIC_ACCESS.replace("\"public\"", "\"c\""),
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "not a rule file").unwrap();

        let registry = PolicyRegistry::from_dir(dir.path()).unwrap();
        let sets = registry.select(&NamespaceSelection::Default);
        let names: Vec<&str> = sets[0].rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn from_dir_requires_rule_files() {
        let dir = tempfile::tempdir().unwrap();
        let reason = config_error(PolicyRegistry::from_dir(dir.path()));
        assert!(reason.contains("no rule files"), "got: {reason}");

        let reason = config_error(PolicyRegistry::from_dir(&dir.path().join("absent")));
        assert!(reason.contains("does not exist"), "got: {reason}");
    }

    #[test]
    fn bundled_policies_load() {
        let registry = PolicyRegistry::from_dir(&bundled_policy_dir()).unwrap();
        assert_eq!(
            registry.namespaces().collect::<Vec<_>>(),
            vec!["main", "principal_objects", "s3_hygiene"]
        );
    }

    // ── End to end ────────────────────────────────────────────────────────────

    fn run(plan: &[u8], selection: NamespaceSelection) -> planguard_contracts::report::Report {
        let registry = PolicyRegistry::from_dir(&bundled_policy_dir()).unwrap();
        let document = JsonPlanLoader::new().load(plan).unwrap();
        let reporter = Reporter::new(Box::new(PlannedResourceMatcher), Box::new(PredicateEvaluator));
        reporter.report(&registry.select(&selection), &document)
    }

    #[test]
    fn public_bucket_policy_yields_one_violation() {
        let plan = plan_with_policy(json!({
            "Statement": [{ "Effect": "Allow", "Principal": "*", "Resource": "arn:x:y/*" }]
        }));

        let report = run(&plan, NamespaceSelection::Default);

        assert_eq!(report.violations.len(), 1);
        assert_eq!(
            report.violations[0].message,
            "Bucket policy allows public access: arn:x:y/*"
        );
        assert_eq!(report.violations[0].address.as_deref(), Some("aws_s3_bucket_policy.site"));
        assert!(!report.passed());
    }

    #[test]
    fn one_violation_regardless_of_other_statements() {
        let plan = plan_with_policy(json!({
            "Statement": [
                { "Effect": "Deny", "Principal": "*", "Resource": "arn:deny" },
                { "Effect": "Allow", "Principal": { "AWS": "arn:aws:iam::123:root" }, "Resource": "arn:private" },
                { "Effect": "Allow", "Principal": "*", "Resource": "arn:x:y/*" },
                { "Effect": "Allow", "Principal": "*", "Resource": "arn:also-public" }
            ]
        }));

        let report = run(&plan, NamespaceSelection::Default);

        assert_eq!(report.violations.len(), 1);
        assert!(report.violations[0].message.ends_with("arn:x:y/*"));
    }

    #[test]
    fn concrete_principal_object_passes() {
        let plan = plan_with_policy(json!({
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "AWS": "arn:aws:iam::123:root" },
                "Resource": "arn:x:y/*"
            }]
        }));

        let report = run(&plan, NamespaceSelection::Default);

        assert!(report.violations.is_empty());
        assert!(report.passed());
        assert_eq!(report.tests, 1);
    }

    #[test]
    fn principal_object_wildcard_only_fails_the_variant() {
        let plan = plan_with_policy(json!({
            "Statement": [{ "Effect": "Allow", "Principal": { "AWS": "*" }, "Resource": "arn:x:y/*" }]
        }));

        assert!(run(&plan, NamespaceSelection::Default).passed());

        let report = run(&plan, NamespaceSelection::All);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].namespace, "principal_objects");
    }

    #[test]
    fn undecodable_policy_is_an_exception_not_a_pass() {
        let plan = serde_json::to_vec(&json!({
            "planned_values": { "root_module": { "resources": [{
                "type": "aws_s3_bucket_policy",
                "values": { "policy": "{\"Statement\": [" }
            }] } }
        }))
        .unwrap();

        let report = run(&plan, NamespaceSelection::Default);

        assert!(report.violations.is_empty());
        assert_eq!(report.exceptions.len(), 1);
        assert_eq!(report.summary().exceptions, 1);
        assert_eq!(report.summary().passed, 0);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let plan = plan_with_policy(json!({
            "Statement": [
                { "Effect": "Allow", "Principal": "*", "Resource": "arn:a" },
                { "Effect": "Allow", "Principal": ["*"], "Resource": "arn:b" }
            ]
        }));

        let first = run(&plan, NamespaceSelection::All);
        let second = run(&plan, NamespaceSelection::All);
        assert_eq!(first, second);
    }
}
