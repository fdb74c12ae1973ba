//! Layout findings collected while building the model.

use super::{Ctx, Rule, Scope};
use crate::error::RuleError;
use crate::models::{RuleId, Violation, ViolationKind};

/// Layout findings recorded by the builder: a missing `modules/` area and
/// module folders with nothing to classify.
pub struct StructureRule;

impl Rule for StructureRule {
    fn id(&self) -> RuleId {
        RuleId::Structure
    }

    fn scope(&self) -> Scope {
        Scope::Project
    }

    fn check_project(&self, ctx: &Ctx) -> Result<Vec<Violation>, RuleError> {
        Ok(ctx
            .model
            .findings
            .iter()
            .filter(|v| v.kind == ViolationKind::StructureViolation)
            .cloned()
            .collect())
    }
}
