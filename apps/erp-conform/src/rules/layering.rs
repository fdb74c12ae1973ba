//! Direct persistence access in routes and controllers.

use super::{describe_hits, Ctx, Rule, Unit};
use crate::error::RuleError;
use crate::models::{Role, RuleId, Violation, ViolationKind};
use crate::parse::source::{find_hits, mask};

/// Routes and controllers must not reach persistence directly.
pub struct LayeringRule;

impl Rule for LayeringRule {
    fn id(&self) -> RuleId {
        RuleId::Layering
    }

    fn check_unit(&self, ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        let p = &ctx.eff.patterns;
        let mut out = Vec::new();
        for f in &unit.files {
            let (patterns, layer) = match f.role {
                Some(Role::Routes) => (&p.routes_persistence, "routes"),
                Some(Role::Controller) => (&p.controller_persistence, "controller"),
                _ => continue,
            };
            // strings stay visible: import paths are part of the signal
            let hits: Vec<(usize, String)> = find_hits(&mask(&f.text, false), patterns)
                .into_iter()
                .map(|h| (h.line, h.text))
                .collect();
            if hits.is_empty() {
                continue;
            }
            out.push(
                Violation::new(
                    RuleId::Layering,
                    ViolationKind::LayeringViolation,
                    f.module_label(),
                    f.path.clone(),
                    format!(
                        "{} layer accesses persistence directly ({}); delegate to a service",
                        layer,
                        describe_hits(&hits)
                    ),
                )
                .with_role(f.role),
            );
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
    fn test_controller_with_persistence_call_yields_one_violation() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "modules/inwards/inwards.controller.ts",
            r#"
import { Inward } from '../../infrastructure/database/models/inward.model';

export async function list(req, res) {
  const rows = await Inward.findAll({ where: {} });
  const one = await Inward.findOne({ where: { id: req.params.id } });
  res.json({ rows, one });
}
"#,
        );
        write(root, "modules/inwards/inwards.service.ts", "Inward.findAll();");
        let found = run_one(&LayeringRule, root);
        assert_eq!(found.len(), 1);
        let v = &found[0];
        assert_eq!(v.subject, "modules/inwards/inwards.controller.ts");
        assert_eq!(v.kind, ViolationKind::LayeringViolation);
        assert_eq!(v.role, Some(Role::Controller));
        assert!(v.message.contains("line 5"));
    }

    #[test]
    fn test_routes_and_commented_calls() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "modules/inwards/inwards.routes.ts",
            "// Inward.findAll() was here\nrouter.get('/', controller.list);\n",
        );
        write(
            root,
            "modules/outwards/outwards.routes.ts",
            "router.get('/', async () => sequelize.query('SELECT 1'));\n",
        );
        let found = run_one(&LayeringRule, root);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].subject, "modules/outwards/outwards.routes.ts");
    }
}
