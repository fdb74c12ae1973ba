//! Report generation: deduplication, total ordering, severity counts and
//! per-module completion.

use crate::models::project::ProjectModel;
use crate::models::{ChecklistItem, Severity, Violation};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    Incomplete,
    Complete,
}

impl CompletionState {
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionState::Incomplete => "Incomplete",
            CompletionState::Complete => "Complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleStatus {
    pub module: String,
    pub state: CompletionState,
    pub satisfied: Vec<ChecklistItem>,
    pub missing: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub modules: usize,
    pub complete: usize,
    pub files: usize,
}

#[derive(Debug, Clone)]
/// Final outcome of a run. Content is fully determined by the input tree.
pub struct Report {
    pub violations: Vec<Violation>,
    pub modules: Vec<ModuleStatus>,
    pub summary: Summary,
}

impl Report {
    /// 1 when some violation is at or above `fail_on`, else 0.
    pub fn exit_code(&self, fail_on: Severity) -> i32 {
        if self.violations.iter().any(|v| v.severity >= fail_on) {
            1
        } else {
            0
        }
    }
}

/// Sort and deduplicate by `(rule, subject)`; the first entry in sort order wins.
pub fn normalize(mut violations: Vec<Violation>) -> Vec<Violation> {
    violations.sort_by(|a, b| {
        a.module
            .cmp(&b.module)
            .then(a.rule.cmp(&b.rule))
            .then(a.subject.cmp(&b.subject))
            .then(a.kind.cmp(&b.kind))
            .then(a.message.cmp(&b.message))
            .then(b.severity.cmp(&a.severity))
    });
    let mut seen = BTreeSet::new();
    violations.retain(|v| seen.insert((v.rule, v.subject.clone())));
    violations
}

fn belongs_to(v: &Violation, module: &str) -> bool {
    v.module == module
        || v
            .module
            .strip_prefix(module)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}

/// Completion of every module descriptor, sorted by qualified name.
pub fn module_statuses(model: &ProjectModel, violations: &[Violation]) -> Vec<ModuleStatus> {
    let mut out: Vec<ModuleStatus> = model
        .all_modules()
        .into_iter()
        .map(|m| {
            let scoped: Vec<&Violation> =
                violations.iter().filter(|v| belongs_to(v, &m.name)).collect();
            let missing: BTreeSet<ChecklistItem> = scoped
                .iter()
                .filter_map(|v| ChecklistItem::for_violation(v))
                .collect();
            ModuleStatus {
                module: m.name.clone(),
                state: if scoped.is_empty() {
                    CompletionState::Complete
                } else {
                    CompletionState::Incomplete
                },
                satisfied: ChecklistItem::ALL
                    .into_iter()
                    .filter(|i| !missing.contains(i))
                    .collect(),
                missing: missing.into_iter().collect(),
            }
        })
        .collect();
    out.sort_by(|a, b| a.module.cmp(&b.module));
    out
}

pub fn generate(model: &ProjectModel, raw: Vec<Violation>) -> Report {
    let violations = normalize(raw);
    let modules = module_statuses(model, &violations);
    let summary = Summary {
        errors: violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count(),
        warnings: violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .count(),
        modules: modules.len(),
        complete: modules
            .iter()
            .filter(|m| m.state == CompletionState::Complete)
            .count(),
        files: model.file_count,
    };
    Report {
        violations,
        modules,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ModuleDescriptor;
    use crate::models::{Role, RuleId, ViolationKind};
    use std::collections::BTreeSet;

    fn module(name: &str, subs: Vec<ModuleDescriptor>) -> ModuleDescriptor {
        ModuleDescriptor {
            name: name.to_string(),
            leaf: name.rsplit('/').next().unwrap().to_string(),
            dir: format!("modules/{}", name),
            roles: Vec::new(),
            submodules: subs,
            unclassified: BTreeSet::new(),
        }
    }

    fn v(rule: RuleId, kind: ViolationKind, module: &str, subject: &str) -> Violation {
        Violation::new(rule, kind, module, subject, "m")
    }

    #[test]
    fn test_normalize_dedups_and_orders() {
        let raw = vec![
            v(RuleId::Slug, ViolationKind::SlugViolation, "b", "x#t"),
            v(RuleId::Naming, ViolationKind::NamingViolation, "b", "z"),
            v(RuleId::Naming, ViolationKind::NamingViolation, "a", "y"),
            v(RuleId::Slug, ViolationKind::SlugViolation, "b", "x#t"),
        ];
        let out = normalize(raw.clone());
        assert_eq!(out.len(), 3);
        assert_eq!(
            out.iter().map(|v| v.subject.as_str()).collect::<Vec<_>>(),
            vec!["y", "z", "x#t"]
        );
        let mut reversed = raw;
        reversed.reverse();
        assert_eq!(normalize(reversed), out);
    }

    #[test]
    fn test_statuses_aggregate_submodules() {
        let model = ProjectModel {
            modules: vec![
                module("inwards", vec![]),
                module("purchases", vec![module("purchases/returns", vec![])]),
                module("purchases-archive", vec![]),
            ],
            file_count: 9,
            ..Default::default()
        };
        let raw = vec![
            v(
                RuleId::Naming,
                ViolationKind::NamingViolation,
                "purchases/returns",
                "modules/purchases/returns/returns.types.ts",
            )
            .with_role(Some(Role::Types)),
            v(
                RuleId::Structure,
                ViolationKind::RuleEvaluationFailed,
                "inwards",
                "modules/inwards/inwards.service.ts",
            ),
        ];
        let report = generate(&model, raw);
        let by = |n: &str| report.modules.iter().find(|m| m.module == n).unwrap();
        assert_eq!(by("purchases").state, CompletionState::Incomplete);
        assert_eq!(by("purchases").missing, vec![ChecklistItem::Types]);
        assert_eq!(by("purchases-archive").state, CompletionState::Complete);
        assert_eq!(by("inwards").state, CompletionState::Incomplete);
        assert!(by("inwards").missing.is_empty());
        assert_eq!(by("inwards").satisfied.len(), ChecklistItem::ALL.len());
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.complete, 1);
        assert_eq!(report.summary.files, 9);
        assert_eq!(report.exit_code(Severity::Error), 1);
    }

    #[test]
    fn test_exit_code_threshold() {
        let model = ProjectModel::default();
        let report = generate(
            &model,
            vec![v(
                RuleId::Constants,
                ViolationKind::HardcodedValueViolation,
                "a",
                "f.ts",
            )],
        );
        assert_eq!(report.exit_code(Severity::Error), 0);
        assert_eq!(report.exit_code(Severity::Warning), 1);
    }
}
