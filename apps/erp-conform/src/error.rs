//! Error taxonomy.
//!
//! Only [`ScanError`] and [`ConfigError`] are fatal: they abort a run before
//! any rule executes and map to exit code 2. Everything a rule can trip over
//! is a [`RuleError`], which the engine converts into a
//! `RuleEvaluationFailed` violation instead of propagating.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("project root does not exist: {0}")]
    Missing(PathBuf),
    #[error("project root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("project root is unreadable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config {path} is not valid TOML: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config {path} is not valid YAML: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unknown rule id '{0}'")]
    UnknownRule(String),
    #[error("invalid {field} value '{value}' (expected {expected})")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("invalid regex in patterns.{field}: {source}")]
    Regex {
        field: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("invalid glob '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Failure of a single rule on a single unit. Never fatal.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("{path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("rule panicked: {0}")]
    Panicked(String),
}

/// The single fatal outcome of a run.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
