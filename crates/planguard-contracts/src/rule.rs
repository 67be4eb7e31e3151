//! Rule and condition types.
//!
//! Rules are deserialized from TOML by `planguard-policy`.  A rule targets
//! one resource type, carries a condition tree, and renders a message when
//! the condition holds.
//!
//! Example in TOML:
//! ```toml
//! [[rules]]
//! name = "s3_bucket_public_policy"
//! resource_type = "aws_s3_bucket_policy"
//! message = "Bucket policy allows public access: {statement.Resource}"
//!
//! [rules.condition.exists]
//! collection = "policy.Statement"
//! bind = "statement"
//!
//! [[rules.condition.exists.condition.and]]
//! equals = { path = "statement.Effect", value = "Allow" }
//!
//! [[rules.condition.exists.condition.and]]
//! wildcard_match = { path = "statement.Principal", pattern = "*", shape = "principal" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a rule produces when its condition holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// A violation.  Fails the run.
    #[default]
    Deny,
    /// A warning.  Reported, but the run still passes.
    Warn,
}

/// How a field is interpreted before it is compared.
///
/// IAM-style principal fields come either as a bare string (`"*"`,
/// `"arn:..."`) or as an object keyed by principal kind
/// (`{"AWS": ["arn:...", ...]}`).  The principal shapes normalize both forms
/// into one canonical set before comparing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldShape {
    /// Compare the value as it appears in the document.
    #[default]
    Plain,
    /// Principal set; only a bare `"*"` string means "everyone".
    Principal,
    /// Principal set; a `"*"` entry inside an object or list also means
    /// "everyone".
    PrincipalNested,
}

impl FieldShape {
    pub fn is_principal(self) -> bool {
        !matches!(self, FieldShape::Plain)
    }
}

/// A condition tree.
///
/// Paths are dot-separated.  Their first segment names an `exists`-bound
/// variable, `resource` (the resource entry itself), or otherwise a key in
/// the resource's `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// The value at `path` equals `value`.
    Equals {
        path: String,
        value: Value,
        #[serde(default)]
        shape: FieldShape,
    },

    /// The value at `path` equals one of `values`.
    In {
        path: String,
        values: Vec<Value>,
        #[serde(default)]
        shape: FieldShape,
    },

    /// The value at `path` is the `*` wildcard, or matches the glob
    /// `pattern`.  A bare `*` pattern only matches the wildcard itself.
    WildcardMatch {
        path: String,
        pattern: String,
        #[serde(default)]
        shape: FieldShape,
    },

    /// Some element of the sequence at `collection` satisfies `condition`
    /// while bound to `bind`.
    Exists {
        collection: String,
        bind: String,
        condition: Box<Condition>,
    },

    /// Every child holds.
    And(Vec<Condition>),
}

/// A single rule loaded from a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Unique within its namespace.  Appears in exceptions and JSON output.
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Exact `type` of the resources this rule inspects.
    #[serde(rename = "resource_type")]
    pub target_resource_type: String,

    #[serde(default)]
    pub severity: Severity,

    pub condition: Condition,

    /// Message with `{path}` placeholders, resolved like condition paths.
    #[serde(rename = "message")]
    pub message_template: String,
}

/// The rules of one namespace, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub namespace: String,
    pub rules: Vec<Rule>,
}
