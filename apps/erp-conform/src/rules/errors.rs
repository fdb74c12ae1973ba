//! Error hierarchy.
//!
//! Outside the errors area, raw `Error` construction is reported. Anywhere,
//! a class named `*Error` or `*Exception` must reach the configured base
//! error through the class index. Problems of one file are reported
//! together.

use super::{describe_hits, Ctx, Rule, Unit};
use crate::error::RuleError;
use crate::models::project::ClassDecl;
use crate::models::{RuleId, Violation, ViolationKind};
use crate::parse::source::{class_decls, find_hits, mask};
use std::collections::{BTreeMap, BTreeSet};

pub struct ErrorHierarchyRule;

#[derive(Debug, PartialEq, Eq)]
enum Ancestry {
    Reaches,
    NoParent(String),
    Unknown(String),
    Cycle(String),
}

fn simple_name(s: &str) -> &str {
    s.rsplit('.').next().unwrap_or(s)
}

fn ancestry(start: &ClassDecl, base: &str, classes: &BTreeMap<String, ClassDecl>) -> Ancestry {
    let mut seen = BTreeSet::new();
    seen.insert(start.name.clone());
    let mut cur = start;
    loop {
        let Some(parent) = cur.extends.as_deref().map(simple_name) else {
            return Ancestry::NoParent(cur.name.clone());
        };
        if parent == base {
            return Ancestry::Reaches;
        }
        if !seen.insert(parent.to_string()) {
            return Ancestry::Cycle(parent.to_string());
        }
        match classes.get(parent) {
            Some(next) => cur = next,
            None => return Ancestry::Unknown(parent.to_string()),
        }
    }
}

impl Rule for ErrorHierarchyRule {
    fn id(&self) -> RuleId {
        RuleId::ErrorHierarchy
    }

    fn check_unit(&self, ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        let base = ctx.eff.patterns.base_error.as_str();
        let errors_dir = format!("{}/", ctx.model.rooted(&ctx.eff.layout.errors_dir));
        let mut out = Vec::new();
        for f in &unit.files {
            let mut problems = Vec::new();
            if !f.path.starts_with(&errors_dir) {
                let hits: Vec<(usize, String)> =
                    find_hits(&mask(&f.text, true), &ctx.eff.patterns.raw_errors)
                        .into_iter()
                        .map(|h| (h.line, h.text))
                        .collect();
                if !hits.is_empty() {
                    problems.push(format!(
                        "raw Error thrown instead of a {} subclass ({})",
                        base,
                        describe_hits(&hits)
                    ));
                }
            }
            for decl in class_decls(&f.text, &f.path) {
                if decl.name == base
                    || !(decl.name.ends_with("Error") || decl.name.ends_with("Exception"))
                {
                    continue;
                }
                let problem = match ancestry(&decl, base, &ctx.model.classes) {
                    Ancestry::Reaches => continue,
                    Ancestry::NoParent(at) if at == decl.name => {
                        format!("class {} (line {}) does not extend {}", decl.name, decl.line, base)
                    }
                    Ancestry::NoParent(at) => format!(
                        "class {} (line {}) does not reach {}: chain ends at {}",
                        decl.name, decl.line, base, at
                    ),
                    Ancestry::Unknown(parent) => format!(
                        "class {} (line {}) extends {}, which does not derive from {}",
                        decl.name, decl.line, parent, base
                    ),
                    Ancestry::Cycle(at) => format!(
                        "class {} (line {}) has a cyclic hierarchy through {}",
                        decl.name, decl.line, at
                    ),
                };
                problems.push(problem);
            }
            if problems.is_empty() {
                continue;
            }
            out.push(
                Violation::new(
                    RuleId::ErrorHierarchy,
                    ViolationKind::ErrorHierarchyViolation,
                    f.module_label(),
                    f.path.clone(),
                    problems.join("; "),
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

    fn decl(name: &str, extends: Option<&str>) -> ClassDecl {
        ClassDecl {
            name: name.to_string(),
            extends: extends.map(str::to_string),
            path: "x.ts".to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_ancestry_lookup() {
        let mut classes = BTreeMap::new();
        for d in [
            decl("AppError", Some("BaseError")),
            decl("NotFoundError", Some("AppError")),
            decl("LoopAError", Some("LoopBError")),
            decl("LoopBError", Some("LoopAError")),
        ] {
            classes.insert(d.name.clone(), d);
        }
        assert_eq!(
            ancestry(&decl("X", Some("NotFoundError")), "BaseError", &classes),
            Ancestry::Reaches
        );
        assert_eq!(
            ancestry(&decl("Y", Some("Error")), "BaseError", &classes),
            Ancestry::Unknown("Error".to_string())
        );
        assert!(matches!(
            ancestry(&classes["LoopAError"], "BaseError", &classes),
            Ancestry::Cycle(_)
        ));
    }

    #[test]
    fn test_raw_errors_and_foreign_hierarchies() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "common/errors/base.error.ts",
            "export class BaseError extends Error {}\nexport class NotFoundError extends BaseError {}\nthrow new Error('ok here');\n",
        );
        write(
            root,
            "modules/inwards/inwards.service.ts",
            "class StockError extends NotFoundError {}\nclass LegacyException extends Error {}\nthrow new Error('boom');\n",
        );
        write(
            root,
            "modules/inwards/inwards.controller.ts",
            "throw new NotFoundError('missing');\n",
        );
        let found = run_one(&ErrorHierarchyRule, root);
        assert_eq!(found.len(), 1);
        let v = &found[0];
        assert_eq!(v.subject, "modules/inwards/inwards.service.ts");
        assert!(v.message.contains("LegacyException"));
        assert!(v.message.contains("raw Error"));
        assert!(!v.message.contains("StockError"));
    }
}
