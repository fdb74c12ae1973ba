//! Documentation of leaf modules.

use super::{Ctx, Rule, Unit};
use crate::error::RuleError;
use crate::models::{Role, RuleId, Violation, ViolationKind};

const DOC_MARKERS: [&str; 3] = ["/**", "@swagger", "@openapi"];

/// A leaf module is documented by a README or by doc blocks on its routes.
pub struct DocumentationRule;

impl Rule for DocumentationRule {
    fn id(&self) -> RuleId {
        RuleId::Documentation
    }

    fn check_unit(&self, _ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        let Some(desc) = unit.descriptor else {
            return Ok(Vec::new());
        };
        if !desc.is_leaf() || desc.unclassified.contains("README.md") {
            return Ok(Vec::new());
        }
        let routes_documented = unit
            .files
            .iter()
            .filter(|f| f.role == Some(Role::Routes))
            .any(|f| DOC_MARKERS.iter().any(|m| f.text.contains(m)));
        if routes_documented {
            return Ok(Vec::new());
        }
        Ok(vec![Violation::new(
            RuleId::Documentation,
            ViolationKind::DocumentationViolation,
            desc.name.clone(),
            format!("{}/README.md", desc.dir),
            format!(
                "module '{}' is undocumented: add a README.md or API doc blocks to its routes",
                desc.name
            ),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testutil::{run_one, write};
    use tempfile::tempdir;

    #[test]
    fn test_readme_or_route_docs_satisfy() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "modules/a/a.routes.ts", "router.get('/');");
        write(root, "modules/a/README.md", "# a");
        write(
            root,
            "modules/b/b.routes.ts",
            "/**\n * @openapi\n * /b:\n */\nrouter.get('/');",
        );
        write(root, "modules/c/c.routes.ts", "// list\nrouter.get('/');");
        let found = run_one(&DocumentationRule, root);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].module, "c");
        assert_eq!(found[0].subject, "modules/c/README.md");
    }
}
