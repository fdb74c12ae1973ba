//! Environment variable reads outside the config area.

use super::{describe_hits, Ctx, Rule, Unit};
use crate::error::RuleError;
use crate::models::{RuleId, Violation, ViolationKind};
use crate::parse::source::{find_hits, mask};

/// Environment variables are read in the config area only.
pub struct EnvAccessRule;

impl Rule for EnvAccessRule {
    fn id(&self) -> RuleId {
        RuleId::EnvAccess
    }

    fn check_unit(&self, ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        let config_dir = format!("{}/", ctx.model.rooted(&ctx.eff.layout.config_dir));
        let mut out = Vec::new();
        for f in &unit.files {
            if f.path.starts_with(&config_dir) {
                continue;
            }
            let hits: Vec<(usize, String)> =
                find_hits(&mask(&f.text, true), &ctx.eff.patterns.env_accessors)
                    .into_iter()
                    .map(|h| (h.line, h.text))
                    .collect();
            if hits.is_empty() {
                continue;
            }
            out.push(
                Violation::new(
                    RuleId::EnvAccess,
                    ViolationKind::EnvAccessViolation,
                    f.module_label(),
                    f.path.clone(),
                    format!(
                        "environment accessed outside {}/ ({})",
                        ctx.eff.layout.config_dir,
                        describe_hits(&hits)
                    ),
                )
                .with_role(f.role),
            );
        }
        Ok(out)
    }
}
