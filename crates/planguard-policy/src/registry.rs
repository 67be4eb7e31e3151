//! Namespace registry.
//!
//! Rule files are TOML.  Each file names its namespace (default `main`) and
//! lists rules in evaluation order:
//!
//! ```toml
//! namespace = "main"
//!
//! [[rules]]
//! name = "s3_bucket_public_policy"
//! resource_type = "aws_s3_bucket_policy"
//! message = "Bucket policy allows public access: {statement.Resource}"
//! # condition tables follow
//! ```
//!
//! Files that share a namespace are appended in the order they are loaded.
//! Namespaces iterate in sorted order, so selecting all of them is
//! deterministic.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use planguard_contracts::{
    error::{PlanguardError, PlanguardResult},
    rule::{Condition, Rule, RuleSet},
};
use planguard_core::{scope::RESOURCE_ROOT, template};

use crate::evaluator::compile_pattern;

/// Namespace evaluated when the caller does not ask for any.
pub const DEFAULT_NAMESPACE: &str = "main";

/// Which namespaces take part in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NamespaceSelection {
    /// Only `DEFAULT_NAMESPACE`.
    #[default]
    Default,
    /// These namespaces, in the given order.
    Named(Vec<String>),
    /// Every registered namespace, in sorted order.
    All,
}

/// The on-disk shape of one rule file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    #[serde(default = "default_namespace")]
    namespace: String,
    #[serde(default)]
    rules: Vec<Rule>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// All loaded rules, grouped by namespace.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    namespaces: BTreeMap<String, Vec<Rule>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a single TOML document.
    ///
    /// Returns `PlanguardError::ConfigError` if the TOML is malformed, does
    /// not match the rule file schema, or contains an invalid rule.
    pub fn from_toml_str(s: &str) -> PlanguardResult<Self> {
        let mut registry = Self::new();
        registry.add_toml_str(s, "<inline>")?;
        Ok(registry)
    }

    /// Load every `*.toml` file under `dir`, recursively, in file-name order.
    pub fn from_dir(dir: &Path) -> PlanguardResult<Self> {
        if !dir.is_dir() {
            return Err(PlanguardError::ConfigError {
                reason: format!("policy directory '{}' does not exist", dir.display()),
            });
        }

        let mut registry = Self::new();
        let mut files = 0usize;
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| PlanguardError::Io {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let contents = std::fs::read_to_string(path).map_err(|e| PlanguardError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            registry.add_toml_str(&contents, &path.display().to_string())?;
            files += 1;
        }

        if files == 0 {
            return Err(PlanguardError::ConfigError {
                reason: format!("no rule files (*.toml) found under '{}'", dir.display()),
            });
        }

        info!(
            dir = %dir.display(),
            files,
            namespaces = registry.namespaces.len(),
            rules = registry.rule_count(),
            "rule files loaded"
        );
        Ok(registry)
    }

    /// Parse `s` as one rule file and append its rules.  `origin` names the
    /// source in error messages.
    pub fn add_toml_str(&mut self, s: &str, origin: &str) -> PlanguardResult<()> {
        let file: RuleFile = toml::from_str(s).map_err(|e| PlanguardError::ConfigError {
            reason: format!("failed to parse rule file '{}': {}", origin, e),
        })?;

        let rules = self.namespaces.entry(file.namespace.clone()).or_default();
        for rule in file.rules {
            validate_rule(&rule).map_err(|reason| PlanguardError::ConfigError {
                reason: format!("{}: rule '{}': {}", origin, rule.name, reason),
            })?;
            if rules.iter().any(|existing| existing.name == rule.name) {
                return Err(PlanguardError::ConfigError {
                    reason: format!(
                        "{}: rule '{}' is already defined in namespace '{}'",
                        origin, rule.name, file.namespace
                    ),
                });
            }
            debug!(namespace = %file.namespace, rule = %rule.name, "rule registered");
            rules.push(rule);
        }
        Ok(())
    }

    /// Registered namespace names, sorted.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub fn rule_count(&self) -> usize {
        self.namespaces.values().map(Vec::len).sum()
    }

    /// The rule sets taking part in a run, in evaluation order.
    ///
    /// A requested namespace with no rules is logged and skipped.
    pub fn select(&self, selection: &NamespaceSelection) -> Vec<RuleSet> {
        let names: Vec<&str> = match selection {
            NamespaceSelection::Default => vec![DEFAULT_NAMESPACE],
            NamespaceSelection::Named(names) => {
                let mut unique: Vec<&str> = Vec::with_capacity(names.len());
                for name in names {
                    if !unique.contains(&name.as_str()) {
                        unique.push(name);
                    }
                }
                unique
            }
            NamespaceSelection::All => self.namespaces().collect(),
        };

        names
            .into_iter()
            .filter_map(|name| match self.namespaces.get(name) {
                Some(rules) => Some(RuleSet {
                    namespace: name.to_string(),
                    rules: rules.clone(),
                }),
                None => {
                    warn!(namespace = name, "requested namespace has no rules");
                    None
                }
            })
            .collect()
    }
}

fn validate_rule(rule: &Rule) -> Result<(), String> {
    if rule.name.trim().is_empty() {
        return Err("rule name must not be empty".to_string());
    }
    if rule.target_resource_type.trim().is_empty() {
        return Err("resource_type must not be empty".to_string());
    }
    template::parse(&rule.message_template).map_err(|e| e.to_string())?;
    validate_condition(&rule.condition)
}

fn validate_condition(condition: &Condition) -> Result<(), String> {
    match condition {
        Condition::Equals { path, .. } | Condition::In { path, .. } => validate_path(path),
        Condition::WildcardMatch { path, pattern, .. } => {
            validate_path(path)?;
            compile_pattern(pattern).map(|_| ()).map_err(|e| e.to_string())
        }
        Condition::Exists {
            collection,
            bind,
            condition,
        } => {
            validate_path(collection)?;
            if bind.is_empty() || bind.contains('.') {
                return Err(format!("invalid variable name '{bind}'"));
            }
            if bind == RESOURCE_ROOT {
                return Err(format!("variable name '{RESOURCE_ROOT}' is reserved"));
            }
            validate_condition(condition)
        }
        Condition::And(children) => children.iter().try_for_each(validate_condition),
    }
}

fn validate_path(path: &str) -> Result<(), String> {
    if path
        .split('.')
        .any(|segment| segment.is_empty() || segment.trim() != segment)
    {
        return Err(format!("invalid path '{path}'"));
    }
    Ok(())
}
