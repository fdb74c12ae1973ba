//! Rule registry and engine.
//!
//! Every rule is an independent, pure check over the shared model. The
//! engine splits the model into units (one per module descriptor plus one
//! for everything outside modules), fans `(unit, rule)` work items out over
//! a rayon pool and appends results to a single collector. A rule that
//! errors or panics yields a `RuleEvaluationFailed` warning for that unit
//! only; every other work item still runs.

mod constants;
mod docs;
mod env;
mod errors;
mod indexing;
mod layering;
mod naming;
mod slug;
mod soft_delete;
mod structure;

use crate::config::Effective;
use crate::error::RuleError;
use crate::models::project::{ModuleDescriptor, NamingToken, ProjectModel, SourceFile};
use crate::models::schema::SchemaEntity;
use crate::models::{RuleId, Violation, ViolationKind};
use crate::parity;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Read-only inputs shared by every rule invocation.
pub struct Ctx<'a> {
    pub model: &'a ProjectModel,
    pub eff: &'a Effective,
}

/// The slice of the model a per-module rule sees.
pub struct Unit<'a> {
    /// `None` for the unit holding everything outside modules.
    pub descriptor: Option<&'a ModuleDescriptor>,
    pub files: Vec<&'a SourceFile>,
    pub tokens: Vec<&'a NamingToken>,
    pub entities: Vec<&'a SchemaEntity>,
}

impl Unit<'_> {
    pub fn label(&self) -> &str {
        self.descriptor.map(|d| d.name.as_str()).unwrap_or("(root)")
    }

    /// Subject used when a rule fails on this unit as a whole.
    fn subject(&self) -> &str {
        self.descriptor.map(|d| d.dir.as_str()).unwrap_or(".")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Evaluated once per unit.
    Module,
    /// Evaluated once over the whole model.
    Project,
}

pub trait Rule: Send + Sync {
    fn id(&self) -> RuleId;

    fn scope(&self) -> Scope {
        Scope::Module
    }

    fn check_unit(&self, _ctx: &Ctx, _unit: &Unit) -> Result<Vec<Violation>, RuleError> {
        Ok(Vec::new())
    }

    fn check_project(&self, _ctx: &Ctx) -> Result<Vec<Violation>, RuleError> {
        Ok(Vec::new())
    }
}

/// All rules in registry order.
pub fn registry() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(structure::StructureRule),
        Box::new(naming::NamingRule),
        Box::new(layering::LayeringRule),
        Box::new(constants::ConstantsRule),
        Box::new(env::EnvAccessRule),
        Box::new(errors::ErrorHierarchyRule),
        Box::new(slug::SlugRule),
        Box::new(soft_delete::SoftDeleteRule),
        Box::new(indexing::IndexingRule),
        Box::new(parity::MigrationParityRule),
        Box::new(parity::MigrationNamingRule),
        Box::new(docs::DocumentationRule),
    ]
}

/// Partition the model into per-module units plus the unscoped remainder.
pub fn units(model: &ProjectModel) -> Vec<Unit<'_>> {
    let modules = model.all_modules();
    let names: BTreeSet<&str> = modules.iter().map(|m| m.name.as_str()).collect();
    let mut out: Vec<Unit> = modules
        .iter()
        .map(|m| Unit {
            descriptor: Some(*m),
            files: model
                .sources
                .iter()
                .filter(|f| f.module.as_deref() == Some(m.name.as_str()))
                .collect(),
            tokens: model.naming.iter().filter(|t| t.module == m.name).collect(),
            entities: model
                .entities
                .iter()
                .filter(|e| e.module.as_deref() == Some(m.name.as_str()))
                .collect(),
        })
        .collect();
    out.push(Unit {
        descriptor: None,
        files: model.sources.iter().filter(|f| f.module.is_none()).collect(),
        tokens: model
            .naming
            .iter()
            .filter(|t| !names.contains(t.module.as_str()))
            .collect(),
        entities: model
            .entities
            .iter()
            .filter(|e| match e.module.as_deref() {
                Some(m) => !names.contains(m),
                None => true,
            })
            .collect(),
    });
    out
}

enum Item<'r, 'u> {
    OnUnit(&'r dyn Rule, &'u Unit<'u>),
    OnProject(&'r dyn Rule),
}

/// Evaluate every enabled rule exhaustively and return the raw violations,
/// with configured severity overrides applied. Order is not meaningful.
pub fn run_rules(model: &ProjectModel, eff: &Effective) -> Vec<Violation> {
    evaluate(&registry(), model, eff)
}

fn evaluate(registry: &[Box<dyn Rule>], model: &ProjectModel, eff: &Effective) -> Vec<Violation> {
    let ctx = Ctx { model, eff };
    let rules: Vec<&dyn Rule> = registry
        .iter()
        .map(|r| r.as_ref())
        .filter(|r| eff.is_enabled(r.id()))
        .collect();
    let units = units(model);

    let mut items: Vec<Item> = Vec::new();
    for rule in rules.iter().copied() {
        match rule.scope() {
            Scope::Project => items.push(Item::OnProject(rule)),
            Scope::Module => {
                for u in &units {
                    items.push(Item::OnUnit(rule, u));
                }
            }
        }
    }
    debug!(rules = rules.len(), units = units.len(), items = items.len(), "dispatching");

    let collector: Mutex<Vec<Violation>> = Mutex::new(Vec::new());
    items.par_iter().for_each(|item| {
        let (rule, label, subject) = match item {
            Item::OnUnit(r, u) => (*r, u.label().to_string(), u.subject().to_string()),
            Item::OnProject(r) => (*r, "(root)".to_string(), ".".to_string()),
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| match item {
            Item::OnUnit(r, u) => r.check_unit(&ctx, u),
            Item::OnProject(r) => r.check_project(&ctx),
        }))
        .unwrap_or_else(|payload| Err(RuleError::Panicked(panic_message(payload.as_ref()))));

        let found = match outcome {
            Ok(v) => v,
            Err(e) => {
                warn!(rule = rule.id().as_str(), unit = %label, error = %e, "rule failed");
                vec![Violation::new(
                    rule.id(),
                    ViolationKind::RuleEvaluationFailed,
                    label,
                    subject,
                    format!("rule '{}' could not be evaluated: {}", rule.id(), e),
                )]
            }
        };
        if found.is_empty() {
            return;
        }
        // a poisoned lock only means another worker panicked mid-push
        let mut guard = collector.lock().unwrap_or_else(|p| p.into_inner());
        guard.extend(found);
    });

    let mut out = collector.into_inner().unwrap_or_else(|p| p.into_inner());
    // parse and read failures found while building are reported regardless of selection
    out.extend(
        model
            .findings
            .iter()
            .filter(|v| v.kind == ViolationKind::RuleEvaluationFailed)
            .cloned(),
    );
    for v in out.iter_mut() {
        if v.kind == ViolationKind::RuleEvaluationFailed {
            continue;
        }
        if let Some(sev) = eff.severity.get(&v.rule) {
            v.severity = *sev;
        }
    }
    out
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// One-line summary of located hits: `line 3 \`x\`, line 9 \`y\``.
pub(crate) fn describe_hits(hits: &[(usize, String)]) -> String {
    const SHOWN: usize = 5;
    let mut parts: Vec<String> = hits
        .iter()
        .take(SHOWN)
        .map(|(line, text)| format!("line {} `{}`", line, text))
        .collect();
    if hits.len() > SHOWN {
        parts.push(format!("and {} more", hits.len() - SHOWN));
    }
    parts.join(", ")
}


#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use crate::models::Severity;
    use tempfile::tempdir;

    struct Exploding;

    impl Rule for Exploding {
        fn id(&self) -> RuleId {
            RuleId::Layering
        }
        fn check_unit(&self, _ctx: &Ctx, unit: &Unit) -> Result<Vec<Violation>, RuleError> {
            if unit.descriptor.is_some() {
                panic!("boom");
            }
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_units_partition_sources_by_module() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "modules/inwards/inwards.routes.ts", "");
        write(root, "modules/outwards/outwards.routes.ts", "");
        write(root, "common/util.ts", "");
        let (model, _) = model_for(root);
        let us = units(&model);
        assert_eq!(us.len(), 3);
        assert_eq!(us[0].label(), "inwards");
        assert_eq!(us[0].files.len(), 1);
        assert_eq!(us[2].label(), "(root)");
        assert_eq!(us[2].files[0].path, "common/util.ts");
    }

    #[test]
    fn test_panicking_rule_is_isolated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "modules/inwards/inwards.routes.ts", "");
        let (model, eff) = model_for(root);
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Exploding), Box::new(naming::NamingRule)];
        let found = evaluate(&rules, &model, &eff);

        let failed: Vec<&Violation> = found
            .iter()
            .filter(|v| v.kind == ViolationKind::RuleEvaluationFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].rule, RuleId::Layering);
        assert_eq!(failed[0].module, "inwards");
        assert_eq!(failed[0].severity, Severity::Warning);
        assert!(failed[0].message.contains("boom"));
        assert_eq!(
            found
                .iter()
                .filter(|v| v.kind == ViolationKind::NamingViolation)
                .count(),
            4
        );
    }

    #[test]
    fn test_engine_applies_severity_override_and_selection() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "modules/inwards/inwards.routes.ts", "");
        let (model, mut eff) = model_for(root);

        let all = run_rules(&model, &eff);
        assert!(all
            .iter()
            .any(|v| v.kind == ViolationKind::NamingViolation && v.severity == Severity::Error));

        eff.severity.insert(RuleId::Naming, Severity::Warning);
        let relaxed = run_rules(&model, &eff);
        assert!(relaxed
            .iter()
            .filter(|v| v.rule == RuleId::Naming)
            .all(|v| v.severity == Severity::Warning));

        eff.enabled = [RuleId::Layering].into_iter().collect();
        assert!(run_rules(&model, &eff).is_empty());
    }

    #[test]
    fn test_describe_hits_truncates() {
        let hits: Vec<(usize, String)> = (1..=7).map(|i| (i, format!("x{}", i))).collect();
        let s = describe_hits(&hits);
        assert!(s.starts_with("line 1 `x1`"));
        assert!(s.ends_with("and 2 more"));
    }
}
