//! Slug identity for lookup tables.

use super::{Ctx, Rule, Unit};
use crate::error::RuleError;
use crate::models::schema::SchemaEntity;
use crate::models::{RuleId, Violation, ViolationKind};

/// Lookup tables (statuses, categories, roles, types, or anything marked
/// `@identity`) are addressed by a unique `slug`, never by numeric id.
pub struct SlugRule;

fn is_identity_table(ctx: &Ctx, e: &SchemaEntity) -> bool {
    e.identity_marker || ctx.eff.patterns.status_tables.iter().any(|re| re.is_match(&e.table))
}

impl Rule for SlugRule {
    fn id(&self) -> RuleId {
        RuleId::Slug
    }

    fn check_unit(&self, ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        let mut out = Vec::new();
        for e in unit.entities.iter().filter(|e| is_identity_table(ctx, e)) {
            let problem = if !e.has_slug() {
                "has no slug field"
            } else if !e.has_unique_index_on("slug") {
                "slug is not uniquely indexed"
            } else {
                continue;
            };
            out.push(Violation::new(
                RuleId::Slug,
                ViolationKind::SlugViolation,
                e.module_label(),
                e.subject(),
                format!("identity table '{}' {}", e.table, problem),
            ));
        }
        Ok(out)
    }
}
