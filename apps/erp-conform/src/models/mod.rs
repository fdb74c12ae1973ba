//! Shared data models: violations, rule identities, roles and checklist items.
//!
//! The structural model produced by the builder lives in [`project`], schema
//! and migration records in [`schema`], and the configuration file schema in
//! [`policy`].

pub mod policy;
pub mod project;
pub mod schema;

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
/// Violation severity. `Warning < Error` so thresholds compare directly.
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warning" | "warn" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identity of a rule in the registry. Declaration order is registry order.
pub enum RuleId {
    Structure,
    Naming,
    Layering,
    Constants,
    EnvAccess,
    ErrorHierarchy,
    Slug,
    SoftDelete,
    Indexing,
    MigrationParity,
    MigrationNaming,
    Documentation,
}

impl RuleId {
    pub const ALL: [RuleId; 12] = [
        RuleId::Structure,
        RuleId::Naming,
        RuleId::Layering,
        RuleId::Constants,
        RuleId::EnvAccess,
        RuleId::ErrorHierarchy,
        RuleId::Slug,
        RuleId::SoftDelete,
        RuleId::Indexing,
        RuleId::MigrationParity,
        RuleId::MigrationNaming,
        RuleId::Documentation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::Structure => "structure",
            RuleId::Naming => "naming",
            RuleId::Layering => "layering",
            RuleId::Constants => "constants",
            RuleId::EnvAccess => "env-access",
            RuleId::ErrorHierarchy => "error-hierarchy",
            RuleId::Slug => "slug",
            RuleId::SoftDelete => "soft-delete",
            RuleId::Indexing => "indexing",
            RuleId::MigrationParity => "migration-parity",
            RuleId::MigrationNaming => "migration-naming",
            RuleId::Documentation => "documentation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        RuleId::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RuleId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
/// Kind of deviation reported. Serialized under its PascalCase name.
pub enum ViolationKind {
    StructureViolation,
    RuleEvaluationFailed,
    NamingViolation,
    LayeringViolation,
    HardcodedValueViolation,
    EnvAccessViolation,
    ErrorHierarchyViolation,
    SlugViolation,
    SoftDeleteViolation,
    IndexViolation,
    MissingMigrationViolation,
    SchemaDriftViolation,
    MigrationNamingViolation,
    DocumentationViolation,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::StructureViolation => "StructureViolation",
            ViolationKind::RuleEvaluationFailed => "RuleEvaluationFailed",
            ViolationKind::NamingViolation => "NamingViolation",
            ViolationKind::LayeringViolation => "LayeringViolation",
            ViolationKind::HardcodedValueViolation => "HardcodedValueViolation",
            ViolationKind::EnvAccessViolation => "EnvAccessViolation",
            ViolationKind::ErrorHierarchyViolation => "ErrorHierarchyViolation",
            ViolationKind::SlugViolation => "SlugViolation",
            ViolationKind::SoftDeleteViolation => "SoftDeleteViolation",
            ViolationKind::IndexViolation => "IndexViolation",
            ViolationKind::MissingMigrationViolation => "MissingMigrationViolation",
            ViolationKind::SchemaDriftViolation => "SchemaDriftViolation",
            ViolationKind::MigrationNamingViolation => "MigrationNamingViolation",
            ViolationKind::DocumentationViolation => "DocumentationViolation",
        }
    }

    /// Severity before any per-rule override from configuration.
    pub fn default_severity(self) -> Severity {
        match self {
            ViolationKind::RuleEvaluationFailed
            | ViolationKind::HardcodedValueViolation
            | ViolationKind::DocumentationViolation => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
/// Responsibility carried by a module file, recognized by its suffix.
pub enum Role {
    Routes,
    Controller,
    Service,
    Validator,
    Types,
}

impl Role {
    /// Required roles in checklist order.
    pub const ALL: [Role; 5] = [
        Role::Routes,
        Role::Controller,
        Role::Service,
        Role::Validator,
        Role::Types,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Role::Routes => "routes",
            Role::Controller => "controller",
            Role::Service => "service",
            Role::Validator => "validator",
            Role::Types => "types",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
/// Items of the per-module completion checklist.
pub enum ChecklistItem {
    #[serde(rename = "routes")]
    Routes,
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "service")]
    Service,
    #[serde(rename = "validator")]
    Validator,
    #[serde(rename = "types")]
    Types,
    #[serde(rename = "no-hardcoded")]
    NoHardcoded,
    #[serde(rename = "slugs")]
    Slugs,
    #[serde(rename = "migration")]
    Migration,
    #[serde(rename = "soft-delete")]
    SoftDelete,
    #[serde(rename = "indexes")]
    Indexes,
    #[serde(rename = "errors")]
    Errors,
    #[serde(rename = "docs")]
    Docs,
}

impl ChecklistItem {
    pub const ALL: [ChecklistItem; 12] = [
        ChecklistItem::Routes,
        ChecklistItem::Controller,
        ChecklistItem::Service,
        ChecklistItem::Validator,
        ChecklistItem::Types,
        ChecklistItem::NoHardcoded,
        ChecklistItem::Slugs,
        ChecklistItem::Migration,
        ChecklistItem::SoftDelete,
        ChecklistItem::Indexes,
        ChecklistItem::Errors,
        ChecklistItem::Docs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChecklistItem::Routes => "routes",
            ChecklistItem::Controller => "controller",
            ChecklistItem::Service => "service",
            ChecklistItem::Validator => "validator",
            ChecklistItem::Types => "types",
            ChecklistItem::NoHardcoded => "no-hardcoded",
            ChecklistItem::Slugs => "slugs",
            ChecklistItem::Migration => "migration",
            ChecklistItem::SoftDelete => "soft-delete",
            ChecklistItem::Indexes => "indexes",
            ChecklistItem::Errors => "errors",
            ChecklistItem::Docs => "docs",
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Routes => ChecklistItem::Routes,
            Role::Controller => ChecklistItem::Controller,
            Role::Service => ChecklistItem::Service,
            Role::Validator => ChecklistItem::Validator,
            Role::Types => ChecklistItem::Types,
        }
    }

    /// Checklist item a violation counts against, if any.
    pub fn for_violation(v: &Violation) -> Option<Self> {
        match v.kind {
            ViolationKind::NamingViolation | ViolationKind::LayeringViolation => {
                v.role.map(ChecklistItem::for_role)
            }
            ViolationKind::HardcodedValueViolation | ViolationKind::EnvAccessViolation => {
                Some(ChecklistItem::NoHardcoded)
            }
            ViolationKind::ErrorHierarchyViolation => Some(ChecklistItem::Errors),
            ViolationKind::SlugViolation => Some(ChecklistItem::Slugs),
            ViolationKind::MissingMigrationViolation
            | ViolationKind::SchemaDriftViolation
            | ViolationKind::MigrationNamingViolation => Some(ChecklistItem::Migration),
            ViolationKind::SoftDeleteViolation => Some(ChecklistItem::SoftDelete),
            ViolationKind::IndexViolation => Some(ChecklistItem::Indexes),
            ViolationKind::DocumentationViolation => Some(ChecklistItem::Docs),
            ViolationKind::StructureViolation | ViolationKind::RuleEvaluationFailed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single reported deviation from the standard.
///
/// `subject` is a root-relative path, optionally followed by `#anchor`
/// (a table name for schema findings). Deduplication uses `(rule, subject)`.
pub struct Violation {
    pub rule: RuleId,
    pub kind: ViolationKind,
    pub severity: Severity,
    pub module: String,
    pub subject: String,
    pub message: String,
    pub role: Option<Role>,
}

impl Violation {
    pub fn new(
        rule: RuleId,
        kind: ViolationKind,
        module: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Violation {
            rule,
            kind,
            severity: kind.default_severity(),
            module: module.into(),
            subject: subject.into(),
            message: message.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }

    /// Path part of the subject.
    pub fn file(&self) -> &str {
        match self.subject.split_once('#') {
            Some((path, _)) => path,
            None => &self.subject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_id_roundtrips_through_str() {
        for id in RuleId::ALL {
            assert_eq!(RuleId::parse(id.as_str()), Some(id));
        }
        assert_eq!(RuleId::parse("nope"), None);
    }

    #[test]
    fn test_violation_file_strips_anchor() {
        let v = Violation::new(
            RuleId::Slug,
            ViolationKind::SlugViolation,
            "status",
            "infrastructure/database/models/status.model.ts#status",
            "m",
        );
        assert_eq!(v.file(), "infrastructure/database/models/status.model.ts");
        assert_eq!(v.severity, Severity::Error);
    }

    #[test]
    fn test_checklist_mapping_uses_role_for_naming() {
        let v = Violation::new(RuleId::Naming, ViolationKind::NamingViolation, "m", "p", "x")
            .with_role(Some(Role::Service));
        assert_eq!(ChecklistItem::for_violation(&v), Some(ChecklistItem::Service));
        let bare = Violation::new(RuleId::Naming, ViolationKind::NamingViolation, "m", "p", "x");
        assert_eq!(ChecklistItem::for_violation(&bare), None);
    }
}
