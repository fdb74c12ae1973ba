//! Index coverage for foreign keys, slugs and status columns.

use super::{Ctx, Rule, Unit};
use crate::config::Patterns;
use crate::error::RuleError;
use crate::models::schema::{FieldDecl, SchemaEntity};
use crate::models::{RuleId, Violation, ViolationKind};

/// Foreign keys, slugs and status columns must be covered by an index.
pub struct IndexingRule;

fn is_foreign_key(f: &FieldDecl, p: &Patterns) -> bool {
    f.references.is_some() || p.foreign_key_fields.iter().any(|re| re.is_match(&f.name))
}

/// Fields of `e` that need index coverage, in declaration order.
fn needs_index<'a>(e: &'a SchemaEntity, p: &Patterns) -> Vec<&'a FieldDecl> {
    e.fields
        .iter()
        .filter(|f| !f.primary_key)
        .filter(|f| is_foreign_key(f, p) || f.name == "slug" || f.name.starts_with("status"))
        .collect()
}

impl Rule for IndexingRule {
    fn id(&self) -> RuleId {
        RuleId::Indexing
    }

    fn check_unit(&self, ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        let mut out = Vec::new();
        for e in &unit.entities {
            let uncovered: Vec<&str> = needs_index(e, &ctx.eff.patterns)
                .into_iter()
                .filter(|f| !e.is_indexed(&f.name))
                .map(|f| f.name.as_str())
                .collect();
            if uncovered.is_empty() {
                continue;
            }
            out.push(Violation::new(
                RuleId::Indexing,
                ViolationKind::IndexViolation,
                e.module_label(),
                e.subject(),
                format!(
                    "entity '{}' has no index on: {}",
                    e.table,
                    uncovered.join(", ")
                ),
            ));
        }
        Ok(out)
    }
}
