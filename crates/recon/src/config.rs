use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::engine::{RunConfig, SideSpec, DEFAULT_CHARSET};
use crate::error::ReconError;
use crate::hooks::{ColumnMissingPolicy, PolicyHooks};
use crate::key::{KeyOrder, KeySpec};
use crate::rule::{ComparisonRule, ValuePredicate, DEFAULT_VALUE_SEPARATOR};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Folder prefix joined to both files and the report.
    #[serde(default)]
    pub test_folder: String,
    #[serde(default = "default_report")]
    pub report: String,
    #[serde(default = "default_charset")]
    pub report_charset: String,
    #[serde(default)]
    pub key_order: KeyOrderConfig,
    pub file_a: FileConfig,
    pub file_b: FileConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_name() -> String {
    "twofile".into()
}

fn default_report() -> String {
    "report.csv".into()
}

fn default_charset() -> String {
    DEFAULT_CHARSET.into()
}

fn default_separator() -> String {
    DEFAULT_VALUE_SEPARATOR.into()
}

/// Accept `"col"` as shorthand for `["col"]`.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(column) => vec![column],
        OneOrMany::Many(columns) => columns,
    })
}

// ---------------------------------------------------------------------------
// Sides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub file: String,
    #[serde(deserialize_with = "one_or_many")]
    pub keys: Vec<String>,
    #[serde(default)]
    pub key_separator: String,
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl FileConfig {
    fn to_side_spec(&self) -> SideSpec {
        SideSpec::new(self.file.clone(), KeySpec::new(self.keys.iter().cloned(), self.key_separator.clone()))
            .with_charset(self.charset.clone())
    }
}

// ---------------------------------------------------------------------------
// Key order + policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrderKind {
    #[default]
    Natural,
    Numeric,
    Prefix,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyOrderConfig {
    #[serde(default)]
    pub kind: KeyOrderKind,
    /// Required for `prefix`.
    #[serde(default)]
    pub delimiter: Option<String>,
}

impl KeyOrderConfig {
    fn to_key_order(&self) -> KeyOrder {
        match self.kind {
            KeyOrderKind::Natural => KeyOrder::natural(),
            KeyOrderKind::Numeric => KeyOrder::numeric(),
            KeyOrderKind::Prefix => KeyOrder::prefix_before(self.delimiter.clone().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub stop_on_duplicates: bool,
    #[serde(default)]
    pub column_missing: ColumnMissingPolicy,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    #[default]
    Exact,
    IgnoreCase,
    Trimmed,
    Numeric,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    #[serde(deserialize_with = "one_or_many")]
    pub keys_a: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub keys_b: Vec<String>,
    #[serde(default = "default_separator")]
    pub separator_a: String,
    #[serde(default = "default_separator")]
    pub separator_b: String,
    #[serde(default)]
    pub predicate: PredicateKind,
    /// Numeric predicate only.
    #[serde(default)]
    pub tolerance: Option<f64>,
}

impl RuleConfig {
    fn to_rule(&self) -> ComparisonRule {
        let predicate = match self.predicate {
            PredicateKind::Exact => ValuePredicate::Exact,
            PredicateKind::IgnoreCase => ValuePredicate::IgnoreCase,
            PredicateKind::Trimmed => ValuePredicate::Trimmed,
            PredicateKind::Numeric => ValuePredicate::Numeric {
                tolerance: self.tolerance.unwrap_or(0.0),
            },
        };
        ComparisonRule::new(self.keys_a.iter().cloned(), self.keys_b.iter().cloned())
            .with_separator_a(self.separator_a.clone())
            .with_separator_b(self.separator_b.clone())
            .with_predicate(predicate)
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for (label, side) in [("file_a", &self.file_a), ("file_b", &self.file_b)] {
            if side.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{label}: file is required")));
            }
            check_columns(&format!("{label}.keys"), &side.keys)?;
        }

        if self.report.trim().is_empty() {
            return Err(ReconError::ConfigValidation("report file name is empty".into()));
        }

        if self.key_order.kind == KeyOrderKind::Prefix
            && self.key_order.delimiter.as_deref().unwrap_or("").is_empty()
        {
            return Err(ReconError::ConfigValidation(
                "key_order: prefix ordering needs a non-empty delimiter".into(),
            ));
        }

        if self.rules.is_empty() {
            return Err(ReconError::ConfigValidation("at least 1 rule is required".into()));
        }

        for (i, rule) in self.rules.iter().enumerate() {
            check_columns(&format!("rules[{i}].keys_a"), &rule.keys_a)?;
            check_columns(&format!("rules[{i}].keys_b"), &rule.keys_b)?;
            if let Some(tolerance) = rule.tolerance {
                if rule.predicate != PredicateKind::Numeric {
                    return Err(ReconError::ConfigValidation(format!(
                        "rules[{i}]: tolerance is only valid with the numeric predicate"
                    )));
                }
                if !tolerance.is_finite() || tolerance < 0.0 {
                    return Err(ReconError::ConfigValidation(format!(
                        "rules[{i}]: tolerance must be a finite non-negative number, got {tolerance}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Build the immutable run configuration, with [`PolicyHooks`] from `[policy]`.
    pub fn to_run_config(&self) -> RunConfig {
        let hooks = PolicyHooks {
            column_missing: self.policy.column_missing,
            stop_on_duplicates: self.policy.stop_on_duplicates,
        };
        RunConfig::new(
            self.file_a.to_side_spec(),
            self.file_b.to_side_spec(),
            self.rules.iter().map(RuleConfig::to_rule).collect(),
        )
        .with_name(self.name.clone())
        .with_test_folder(self.test_folder.clone())
        .with_key_order(self.key_order.to_key_order())
        .with_hooks(Arc::new(hooks))
    }
}

fn check_columns(label: &str, columns: &[String]) -> Result<(), ReconError> {
    if columns.is_empty() {
        return Err(ReconError::ConfigValidation(format!("{label}: at least 1 column is required")));
    }
    if columns.iter().any(|c| c.is_empty()) {
        return Err(ReconError::ConfigValidation(format!("{label}: column names must not be empty")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
