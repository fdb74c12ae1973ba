//! Candidate hardcoded values outside the constants area.
//!
//! Heuristic: enum-style string literals matching `patterns.constant_literals`
//! and numbers outside `patterns.allowed_numbers`. Values the constants area
//! already declares are not reported. Comments never count.

use super::{describe_hits, Ctx, Rule, Unit};
use crate::error::RuleError;
use crate::models::project::{Area, SourceFile};
use crate::models::{RuleId, Violation, ViolationKind};
use crate::parse::source::{find_hits, mask, number_literals};

pub struct ConstantsRule;

fn in_scope(ctx: &Ctx, f: &SourceFile) -> bool {
    let layout = &ctx.eff.layout;
    let rel = f
        .path
        .strip_prefix(&ctx.model.base)
        .map(|p| p.trim_start_matches('/'))
        .unwrap_or(&f.path);
    let under = |dir: &str| rel.starts_with(&format!("{}/", dir));
    matches!(
        f.area,
        Area::Modules | Area::Api | Area::Bootstrap | Area::Common
    ) && !under(&layout.constants_dir)
        && !under(&layout.errors_dir)
}

impl Rule for ConstantsRule {
    fn id(&self) -> RuleId {
        RuleId::Constants
    }

    fn check_unit(&self, ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        let p = &ctx.eff.patterns;
        let declared = &ctx.model.constant_literals;
        let mut out = Vec::new();
        for f in unit.files.iter().filter(|f| in_scope(ctx, f)) {
            let mut sites: Vec<(usize, String)> = Vec::new();
            for h in find_hits(&mask(&f.text, false), &p.constant_literals) {
                let value = h.group.clone().unwrap_or_else(|| h.text.clone());
                if !declared.contains(&value) {
                    sites.push((h.line, h.text));
                }
            }
            for (line, n) in number_literals(&mask(&f.text, true)) {
                let Ok(value) = n.parse::<f64>() else { continue };
                let allowed = value.fract() == 0.0
                    && value >= p.allowed_numbers.min as f64
                    && value <= p.allowed_numbers.max as f64;
                if !allowed && !declared.contains(&n) {
                    sites.push((line, n));
                }
            }
            if sites.is_empty() {
                continue;
            }
            sites.sort();
            sites.dedup();
            out.push(
                Violation::new(
                    RuleId::Constants,
                    ViolationKind::HardcodedValueViolation,
                    f.module_label(),
                    f.path.clone(),
                    format!(
                        "possible hardcoded values, move them to {} ({})",
                        ctx.eff.layout.constants_dir,
                        describe_hits(&sites)
                    ),
                )
                .with_role(f.role),
            );
        }
        Ok(out)
    }
}
