//! Naming and completeness of module folders.
//!
//! Reports every non-compliant naming token of the unit and, for a leaf
//! module, one violation per missing role file. The subject of a missing
//! role is the path the file is expected at.

use super::{Ctx, Rule, Unit};
use crate::error::RuleError;
use crate::models::{Role, RuleId, Violation, ViolationKind};

pub struct NamingRule;

impl Rule for NamingRule {
    fn id(&self) -> RuleId {
        RuleId::Naming
    }

    fn check_unit(&self, ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        let mut out = Vec::new();
        for t in unit.tokens.iter().filter(|t| !t.compliant) {
            let reason = t.reason.as_deref().unwrap_or("name does not follow conventions");
            // only missing files count against a role
            out.push(Violation::new(
                RuleId::Naming,
                ViolationKind::NamingViolation,
                t.module.clone(),
                t.path.clone(),
                format!("{}: '{}'", reason, t.segment),
            ));
        }

        let Some(desc) = unit.descriptor else {
            return Ok(out);
        };
        if !desc.is_leaf() {
            return Ok(out);
        }
        let ext = ctx
            .eff
            .layout
            .extensions
            .first()
            .map(String::as_str)
            .unwrap_or("ts");
        for role in Role::ALL.into_iter().filter(|r| !desc.has_role(*r)) {
            let expected = format!("{}/{}.{}.{}", desc.dir, desc.leaf, role.suffix(), ext);
            out.push(
                Violation::new(
                    RuleId::Naming,
                    ViolationKind::NamingViolation,
                    desc.name.clone(),
                    expected,
                    format!("module '{}' has no {} file", desc.name, role.suffix()),
                )
                .with_role(Some(role)),
            );
        }
        Ok(out)
    }
}
