//! Configuration file schema (`erp-conform.toml|yaml|yml`).
//!
//! Key sections:
//! - top level: `format`, `fail_on`, `color`, `ignore`, `rules` (allowlist),
//!   `disabled`, and a `[severity]` map of rule id to `warning|error`.
//! - `[layout]`: where the conventional areas, models and migrations live.
//! - `[patterns]`: detection patterns for the heuristic rules. Every list
//!   replaces the built-in default when present.
//!
//! Unknown keys are rejected so that a typo never silently disables a check.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// Root configuration document.
pub struct ConformConfig {
    pub format: Option<String>,
    pub fail_on: Option<String>,
    pub color: Option<String>,
    pub ignore: Option<Vec<String>>,
    /// When set, only these rule ids run.
    pub rules: Option<Vec<String>>,
    #[serde(default)]
    pub disabled: Vec<String>,
    #[serde(default)]
    pub severity: BTreeMap<String, String>,
    #[serde(default)]
    pub layout: LayoutCfg,
    #[serde(default)]
    pub patterns: PatternsCfg,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// Project layout section under `[layout]`. Directories are relative to the
/// source base; `models` and `migrations` are globs relative to it.
pub struct LayoutCfg {
    pub source_root: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub constants_dir: Option<String>,
    pub config_dir: Option<String>,
    pub errors_dir: Option<String>,
    pub models: Option<Vec<String>>,
    pub migrations: Option<Vec<String>>,
    pub allowed_module_files: Option<Vec<String>>,
    pub module_support_dirs: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// Heuristic detection patterns under `[patterns]` (regular expressions
/// unless noted).
pub struct PatternsCfg {
    pub routes_persistence: Option<Vec<String>>,
    pub controller_persistence: Option<Vec<String>>,
    pub constant_literals: Option<Vec<String>>,
    pub allowed_numbers: Option<NumberRange>,
    pub env_accessors: Option<Vec<String>>,
    pub raw_errors: Option<Vec<String>>,
    /// Class name every custom error must descend from (plain name).
    pub base_error: Option<String>,
    pub status_tables: Option<Vec<String>>,
    /// Field names accepted as the soft-delete marker (plain names).
    pub soft_delete_fields: Option<Vec<String>>,
    pub manual_delete_fields: Option<Vec<String>>,
    /// Field names treated as foreign keys even without `references`.
    pub foreign_key_fields: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
/// Inclusive range of numeric literals that are not magic numbers.
pub struct NumberRange {
    pub min: i64,
    pub max: i64,
}
