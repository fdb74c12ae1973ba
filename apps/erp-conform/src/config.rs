//! Configuration discovery and effective settings resolution.
//!
//! erp-conform reads `erp-conform.toml|yaml|yml` from the validated root, or
//! the file passed with `--config`, and merges it with CLI flags to produce an
//! [`Effective`] config. Defaults:
//! - `format`: `text`
//! - `fail_on`: `error`
//! - `color`: `auto`
//! - rules: all enabled
//! - layout: `common/constants`, `config`, `common/errors`,
//!   `infrastructure/database/{models,migrations}`
//!
//! Overrides precedence: CLI > config file > defaults. Patterns are compiled
//! here, so a bad regex or glob is a [`ConfigError`] before anything runs.
//! No environment variables are consulted.

use crate::error::ConfigError;
use crate::models::policy::{ConformConfig, NumberRange};
use crate::models::{RuleId, Severity};
use glob::{MatchOptions, Pattern};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: [&str; 3] =
    ["erp-conform.toml", "erp-conform.yaml", "erp-conform.yml"];

pub const DEFAULT_IGNORE: [&str; 11] = [
    "logs",
    "*.log",
    "node_modules",
    "dist",
    "build",
    "coverage",
    ".git",
    ".svn",
    ".hg",
    "*.generated.ts",
    "*.generated.js",
];

const DEFAULT_ROUTES_PERSISTENCE: [&str; 3] = [
    r"\b[A-Z][A-Za-z0-9_]*\.(findAll|findOne|findByPk|findAndCountAll|findOrCreate|create|bulkCreate|update|destroy|upsert|count|increment|decrement)\s*\(",
    r"\bsequelize\s*\.\s*(query|transaction|models)\b",
    r"\bQueryTypes\.",
];

const DEFAULT_CONTROLLER_PERSISTENCE: [&str; 4] = [
    r#"\bfrom\s+['"][^'"]*(infrastructure/database|/models)(/[^'"]*)?['"]"#,
    r#"\brequire\(\s*['"][^'"]*(infrastructure/database|/models)(/[^'"]*)?['"]\s*\)"#,
    r"\b[A-Z][A-Za-z0-9_]*\.(findAll|findOne|findByPk|findAndCountAll|findOrCreate|create|bulkCreate|update|destroy|upsert|count|increment|decrement)\s*\(",
    r"\bsequelize\s*\.\s*(query|transaction|models)\b",
];

const DEFAULT_CONSTANT_LITERALS: [&str; 1] =
    [r#"['"]([A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+|[A-Z]{3,})['"]"#];

const DEFAULT_ENV_ACCESSORS: [&str; 4] = [
    r"\bprocess\.env\b",
    r"\bimport\.meta\.env\b",
    r"\bDeno\.env\b",
    r"\bBun\.env\b",
];

const DEFAULT_RAW_ERRORS: [&str; 2] = [r"\bnew\s+Error\s*\(", r"\bthrow\s+Error\s*\("];

const DEFAULT_STATUS_TABLES: [&str; 1] =
    [r"(?i)(^|_)(status|statuses|category|categories|role|roles|type|types)$"];

const DEFAULT_MANUAL_DELETE_FIELDS: [&str; 1] = [r"(?i)^(is_?deleted|deleted|is_?removed)$"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Default)]
/// Raw CLI inputs; `None` means "not given on the command line".
pub struct CliOverrides {
    pub root: String,
    pub format: Option<String>,
    pub fail_on: Option<String>,
    pub rules: Option<String>,
    pub config: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
/// Layout settings. Directories and globs are relative to the source base.
pub struct Layout {
    pub source_root: Option<String>,
    pub extensions: Vec<String>,
    pub constants_dir: String,
    pub config_dir: String,
    pub errors_dir: String,
    pub models: Vec<Pattern>,
    pub migrations: Vec<Pattern>,
    pub allowed_module_files: Vec<Pattern>,
    pub module_support_dirs: Vec<String>,
}

impl Layout {
    pub fn is_source(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((_, ext)) => self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }

    pub fn is_model(&self, rel: &str) -> bool {
        self.models.iter().any(|p| p.matches_with(rel, path_match()))
    }

    pub fn is_migration(&self, rel: &str) -> bool {
        self.migrations.iter().any(|p| p.matches_with(rel, path_match()))
    }

    pub fn is_allowed_module_file(&self, name: &str) -> bool {
        self.allowed_module_files.iter().any(|p| p.matches(name))
    }
}

#[derive(Debug, Clone)]
/// Compiled detection patterns for the heuristic rules.
pub struct Patterns {
    pub routes_persistence: Vec<Regex>,
    pub controller_persistence: Vec<Regex>,
    pub constant_literals: Vec<Regex>,
    pub allowed_numbers: NumberRange,
    pub env_accessors: Vec<Regex>,
    pub raw_errors: Vec<Regex>,
    pub base_error: String,
    pub status_tables: Vec<Regex>,
    pub soft_delete_fields: Vec<String>,
    pub manual_delete_fields: Vec<Regex>,
    pub foreign_key_fields: Vec<Regex>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by a run after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub format: OutputFormat,
    pub fail_on: Severity,
    pub color: ColorMode,
    pub ignore: Vec<Pattern>,
    pub enabled: BTreeSet<RuleId>,
    pub severity: BTreeMap<RuleId, Severity>,
    pub layout: Layout,
    pub patterns: Patterns,
}

impl Effective {
    /// Defaults for `root` with no config file and no CLI overrides.
    pub fn defaults(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        resolve(root.into(), None, ConformConfig::default(), &CliOverrides::default())
    }

    pub fn is_enabled(&self, rule: RuleId) -> bool {
        self.enabled.contains(&rule)
    }

    pub fn is_ignored(&self, name: &str, rel: &str) -> bool {
        self.ignore
            .iter()
            .any(|p| p.matches(name) || p.matches_with(rel, path_match()))
    }
}

fn path_match() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

/// Load the config file: the explicit path when given, otherwise the first
/// `erp-conform.{toml,yaml,yml}` found in `root`.
pub fn load_config(
    root: &Path,
    explicit: Option<&Path>,
) -> Result<Option<(PathBuf, ConformConfig)>, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match CONFIG_FILE_NAMES
            .iter()
            .map(|n| root.join(n))
            .find(|p| p.is_file())
        {
            Some(p) => p,
            None => return Ok(None),
        },
    };
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let cfg = if is_yaml {
        serde_yaml::from_str::<ConformConfig>(&text).map_err(|source| ConfigError::Yaml {
            path: path.clone(),
            source,
        })?
    } else {
        toml::from_str::<ConformConfig>(&text).map_err(|source| ConfigError::Toml {
            path: path.clone(),
            source,
        })?
    };
    Ok(Some((path, cfg)))
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliOverrides) -> Result<Effective, ConfigError> {
    let root = PathBuf::from(if cli.root.is_empty() { "." } else { &cli.root });
    let loaded = load_config(&root, cli.config.as_deref().map(Path::new))?;
    let (path, cfg) = match loaded {
        Some((p, c)) => (Some(p), c),
        None => (None, ConformConfig::default()),
    };
    resolve(root, path, cfg, cli)
}

fn resolve(
    root: PathBuf,
    config_path: Option<PathBuf>,
    cfg: ConformConfig,
    cli: &CliOverrides,
) -> Result<Effective, ConfigError> {
    let format_src = cli
        .format
        .clone()
        .or(cfg.format.clone())
        .unwrap_or_else(|| "text".to_string());
    let format = match format_src.as_str() {
        "text" | "human" => OutputFormat::Text,
        "json" => OutputFormat::Json,
        _ => {
            return Err(ConfigError::InvalidValue {
                field: "format",
                value: format_src,
                expected: "text|json",
            })
        }
    };

    let fail_src = cli
        .fail_on
        .clone()
        .or(cfg.fail_on.clone())
        .unwrap_or_else(|| "error".to_string());
    let fail_on = Severity::parse(&fail_src).ok_or(ConfigError::InvalidValue {
        field: "fail_on",
        value: fail_src.clone(),
        expected: "warning|error",
    })?;

    let color_src = cli
        .color
        .clone()
        .or(cfg.color.clone())
        .unwrap_or_else(|| "auto".to_string());
    let color = match color_src.as_str() {
        "auto" => ColorMode::Auto,
        "always" => ColorMode::Always,
        "never" => ColorMode::Never,
        _ => {
            return Err(ConfigError::InvalidValue {
                field: "color",
                value: color_src,
                expected: "auto|always|never",
            })
        }
    };

    let mut ignore = Vec::new();
    for raw in DEFAULT_IGNORE
        .iter()
        .map(|s| s.to_string())
        .chain(cfg.ignore.clone().unwrap_or_default())
    {
        ignore.push(compile_glob(&raw)?);
    }

    // --rules replaces the config allowlist; `disabled` always applies.
    let selected: Option<Vec<String>> = match cli.rules.as_deref() {
        Some(list) => Some(
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        None => cfg.rules.clone(),
    };
    let mut enabled: BTreeSet<RuleId> = match selected {
        Some(ids) => ids
            .iter()
            .map(|id| parse_rule(id))
            .collect::<Result<_, _>>()?,
        None => RuleId::ALL.into_iter().collect(),
    };
    for id in &cfg.disabled {
        enabled.remove(&parse_rule(id)?);
    }

    let mut severity = BTreeMap::new();
    for (id, level) in &cfg.severity {
        let rule = parse_rule(id)?;
        let sev = Severity::parse(level).ok_or(ConfigError::InvalidValue {
            field: "severity",
            value: level.clone(),
            expected: "warning|error",
        })?;
        severity.insert(rule, sev);
    }

    let layout = resolve_layout(&cfg)?;
    let patterns = resolve_patterns(&cfg)?;

    Ok(Effective {
        root,
        config_path,
        format,
        fail_on,
        color,
        ignore,
        enabled,
        severity,
        layout,
        patterns,
    })
}

fn parse_rule(id: &str) -> Result<RuleId, ConfigError> {
    RuleId::parse(id).ok_or_else(|| ConfigError::UnknownRule(id.trim().to_string()))
}

fn resolve_layout(cfg: &ConformConfig) -> Result<Layout, ConfigError> {
    let l = &cfg.layout;
    let extensions = l
        .extensions
        .clone()
        .unwrap_or_else(|| vec!["ts".to_string(), "js".to_string()]);
    let models_src = l.models.clone().unwrap_or_else(|| {
        extensions
            .iter()
            .map(|e| format!("infrastructure/database/models/**/*.model.{}", e))
            .collect()
    });
    let migrations_src = l
        .migrations
        .clone()
        .unwrap_or_else(|| vec!["infrastructure/database/migrations/*".to_string()]);
    let allowed_src = l.allowed_module_files.clone().unwrap_or_else(|| {
        let mut v = vec!["README.md".to_string()];
        for e in &extensions {
            v.push(format!("index.{}", e));
            v.push(format!("*.test.{}", e));
            v.push(format!("*.spec.{}", e));
        }
        v
    });
    Ok(Layout {
        source_root: l.source_root.clone(),
        constants_dir: trim_dir(l.constants_dir.as_deref().unwrap_or("common/constants")),
        config_dir: trim_dir(l.config_dir.as_deref().unwrap_or("config")),
        errors_dir: trim_dir(l.errors_dir.as_deref().unwrap_or("common/errors")),
        models: compile_globs(&models_src)?,
        migrations: compile_globs(&migrations_src)?,
        allowed_module_files: compile_globs(&allowed_src)?,
        module_support_dirs: l.module_support_dirs.clone().unwrap_or_else(|| {
            ["__tests__", "tests", "dto", "helpers"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        }),
        extensions,
    })
}

fn resolve_patterns(cfg: &ConformConfig) -> Result<Patterns, ConfigError> {
    let p = &cfg.patterns;
    Ok(Patterns {
        routes_persistence: compile_regexes(
            "routes_persistence",
            p.routes_persistence.as_deref(),
            &DEFAULT_ROUTES_PERSISTENCE,
        )?,
        controller_persistence: compile_regexes(
            "controller_persistence",
            p.controller_persistence.as_deref(),
            &DEFAULT_CONTROLLER_PERSISTENCE,
        )?,
        constant_literals: compile_regexes(
            "constant_literals",
            p.constant_literals.as_deref(),
            &DEFAULT_CONSTANT_LITERALS,
        )?,
        allowed_numbers: p.allowed_numbers.unwrap_or(NumberRange { min: -1, max: 2 }),
        env_accessors: compile_regexes(
            "env_accessors",
            p.env_accessors.as_deref(),
            &DEFAULT_ENV_ACCESSORS,
        )?,
        raw_errors: compile_regexes("raw_errors", p.raw_errors.as_deref(), &DEFAULT_RAW_ERRORS)?,
        base_error: p
            .base_error
            .clone()
            .unwrap_or_else(|| "BaseError".to_string()),
        status_tables: compile_regexes(
            "status_tables",
            p.status_tables.as_deref(),
            &DEFAULT_STATUS_TABLES,
        )?,
        soft_delete_fields: p
            .soft_delete_fields
            .clone()
            .unwrap_or_else(|| vec!["deletedAt".to_string(), "deleted_at".to_string()]),
        manual_delete_fields: compile_regexes(
            "manual_delete_fields",
            p.manual_delete_fields.as_deref(),
            &DEFAULT_MANUAL_DELETE_FIELDS,
        )?,
        foreign_key_fields: compile_regexes(
            "foreign_key_fields",
            p.foreign_key_fields.as_deref(),
            &[],
        )?,
    })
}

fn compile_regexes(
    field: &'static str,
    configured: Option<&[String]>,
    defaults: &[&str],
) -> Result<Vec<Regex>, ConfigError> {
    let sources: Vec<String> = match configured {
        Some(list) => list.to_vec(),
        None => defaults.iter().map(|s| s.to_string()).collect(),
    };
    sources
        .iter()
        .map(|s| Regex::new(s).map_err(|source| ConfigError::Regex { field, source }))
        .collect()
}

fn compile_globs(sources: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    sources.iter().map(|s| compile_glob(s)).collect()
}

fn compile_glob(s: &str) -> Result<Pattern, ConfigError> {
    Pattern::new(s).map_err(|source| ConfigError::Glob {
        pattern: s.to_string(),
        source,
    })
}

fn trim_dir(s: &str) -> String {
    s.trim_matches('/').to_string()
}
