use super::{Ctx, Rule, Unit};
use crate::error::RuleError;
use crate::models::{RuleId, Violation, ViolationKind};

/// Records are never hard-deleted: each entity declares the soft-delete
/// marker (`paranoid: true` or a deletion timestamp field) and carries no
/// hand-rolled boolean flag. One violation per entity at most.
pub struct SoftDeleteRule;

impl Rule for SoftDeleteRule {
    fn id(&self) -> RuleId {
        RuleId::SoftDelete
    }

    fn check_unit(&self, ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        let p = &ctx.eff.patterns;
        let mut out = Vec::new();
        for e in &unit.entities {
            let marked = e.paranoid
                || p
                    .soft_delete_fields
                    .iter()
                    .any(|name| e.field(name).is_some());
            let manual: Vec<&str> = e
                .fields
                .iter()
                .filter(|f| p.manual_delete_fields.iter().any(|re| re.is_match(&f.name)))
                .map(|f| f.name.as_str())
                .collect();

            let mut problems = Vec::new();
            if !marked {
                problems.push("does not declare the soft-delete marker (paranoid: true)".to_string());
            }
            if !manual.is_empty() {
                problems.push(format!("declares manual deletion flag(s): {}", manual.join(", ")));
            }
            if problems.is_empty() {
                continue;
            }
            out.push(Violation::new(
                RuleId::SoftDelete,
                ViolationKind::SoftDeleteViolation,
                e.module_label(),
                e.subject(),
                format!("entity '{}' {}", e.table, problems.join(" and ")),
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testutil::{run_one, write};
    use tempfile::tempdir;

    #[test]
    fn test_manual_flag_without_marker_is_one_violation() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "infrastructure/database/models/supplier.model.ts",
            "Supplier.init({ id: DataTypes.INTEGER, is_deleted: DataTypes.BOOLEAN }, { tableName: 'supplier' });",
        );
        let found = run_one(&SoftDeleteRule, root);
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("paranoid"));
        assert!(found[0].message.contains("is_deleted"));
    }

    #[test]
    fn test_marker_variants() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "infrastructure/database/models/a.model.ts",
            "A.init({ id: DataTypes.INTEGER }, { tableName: 'a', paranoid: true });",
        );
        write(
            root,
            "infrastructure/database/models/b.model.ts",
            "B.init({ id: DataTypes.INTEGER, deletedAt: DataTypes.DATE }, { tableName: 'b' });",
        );
        write(
            root,
            "infrastructure/database/models/c.model.ts",
            "C.init({ id: DataTypes.INTEGER, isDeleted: DataTypes.BOOLEAN }, { tableName: 'c', paranoid: true });",
        );
        let found = run_one(&SoftDeleteRule, root);
        assert_eq!(found.len(), 1);
        assert!(found[0].subject.ends_with("#c"));
        assert!(!found[0].message.contains("marker"));
    }
}
