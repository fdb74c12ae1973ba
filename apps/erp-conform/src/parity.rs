//! Schema and migration parity.
//!
//! For each entity, the migration records of its table are replayed in
//! chronological order, starting at the latest `createTable` (or from an
//! empty table when none exists), and the resulting columns are compared
//! with the declared fields. Migration filenames are checked separately.

use crate::error::RuleError;
use crate::models::schema::{MigrationOp, MigrationRecord, SchemaEntity};
use crate::models::{RuleId, Violation, ViolationKind};
use crate::parse::migration::timestamp_token;
use crate::rules::{Ctx, Rule, Scope, Unit};
use std::collections::BTreeMap;

/// Column name to nullability after replaying `ops` in order.
pub fn replay<'a>(ops: impl IntoIterator<Item = &'a MigrationOp>) -> BTreeMap<String, bool> {
    let ops: Vec<&MigrationOp> = ops.into_iter().collect();
    let start = ops.iter().rposition(|op| op.is_create()).unwrap_or(0);
    let mut cols = BTreeMap::new();
    for op in &ops[start..] {
        match op {
            MigrationOp::Create(defs) => {
                cols = defs.iter().map(|c| (c.name.clone(), c.nullable)).collect();
            }
            MigrationOp::AddColumn(c) | MigrationOp::ChangeColumn(c) => {
                cols.insert(c.name.clone(), c.nullable);
            }
            MigrationOp::RemoveColumn(name) => {
                cols.remove(name);
            }
            MigrationOp::RenameColumn { from, to } => {
                if let Some(n) = cols.remove(from) {
                    cols.insert(to.clone(), n);
                }
            }
            MigrationOp::Drop => cols.clear(),
        }
    }
    cols
}

fn null_word(nullable: bool) -> &'static str {
    if nullable {
        "NULL"
    } else {
        "NOT NULL"
    }
}

/// Compare one entity against the migrations (sorted chronologically).
pub fn check_entity(e: &SchemaEntity, migrations: &[MigrationRecord]) -> Option<Violation> {
    let records: Vec<&MigrationRecord> = migrations.iter().filter(|r| r.table == e.table).collect();
    if records.is_empty() {
        return Some(Violation::new(
            RuleId::MigrationParity,
            ViolationKind::MissingMigrationViolation,
            e.module_label(),
            e.subject(),
            format!("no migration creates or alters table '{}'", e.table),
        ));
    }
    let cols = replay(records.iter().flat_map(|r| r.ops.iter()));

    let mut missing = Vec::new();
    let mut nullability = Vec::new();
    for f in &e.fields {
        match cols.get(&f.name) {
            None => missing.push(f.name.as_str()),
            Some(n) if *n != f.nullable => nullability.push(format!(
                "{} (model {}, migrations {})",
                f.name,
                null_word(f.nullable),
                null_word(*n)
            )),
            Some(_) => {}
        }
    }
    if missing.is_empty() && nullability.is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("columns missing from migrations: {}", missing.join(", ")));
    }
    if !nullability.is_empty() {
        parts.push(format!("nullability differs: {}", nullability.join(", ")));
    }
    Some(Violation::new(
        RuleId::MigrationParity,
        ViolationKind::SchemaDriftViolation,
        e.module_label(),
        e.subject(),
        format!("table '{}' drifted from its migrations; {}", e.table, parts.join("; ")),
    ))
}

pub struct MigrationParityRule;

impl Rule for MigrationParityRule {
    fn id(&self) -> RuleId {
        RuleId::MigrationParity
    }

    fn check_unit(&self, ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        Ok(unit
            .entities
            .iter()
            .filter_map(|e| check_entity(e, &ctx.model.migrations))
            .collect())
    }
}

/// `<14-digit timestamp>-<kebab-slug>.<ext>` for every migration file.
pub struct MigrationNamingRule;

impl Rule for MigrationNamingRule {
    fn id(&self) -> RuleId {
        RuleId::MigrationNaming
    }

    fn scope(&self) -> Scope {
        Scope::Project
    }

    fn check_project(&self, ctx: &Ctx) -> Result<Vec<Violation>, RuleError> {
        Ok(ctx
            .model
            .migration_files
            .iter()
            .filter_map(|path| {
                let filename = path.rsplit('/').next().unwrap_or(path);
                if timestamp_token(filename).is_some() {
                    return None;
                }
                Some(Violation::new(
                    RuleId::MigrationNaming,
                    ViolationKind::MigrationNamingViolation,
                    "infrastructure",
                    path.clone(),
                    format!(
                        "migration '{}' is not named <YYYYMMDDHHMMSS>-<kebab-slug>.<ext>",
                        filename
                    ),
                ))
            })
            .collect())
    }
}
