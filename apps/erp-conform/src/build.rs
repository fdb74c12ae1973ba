//! Structural model builder.
//!
//! Interprets the scanned tree into a [`ProjectModel`]: module descriptors
//! and naming tokens under `modules/`, source files tagged with area, module
//! and role, the class index, the constants-area literal set, schema
//! entities and migration records.
//!
//! Failures on individual files never abort the build. They become
//! `RuleEvaluationFailed` findings scoped to the file (fail-isolated).

use crate::config::Effective;
use crate::models::project::{
    Area, ModuleDescriptor, NamingToken, NodeKind, ProjectModel, ScannedTree, SourceFile, TreeNode,
};
use crate::models::schema::{MigrationRecord, SchemaEntity};
use crate::models::{Role, RuleId, Violation, ViolationKind};
use crate::parse::{migration, schema, source};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Build the structural model for the tree scanned from `root`.
pub fn build_model(root: &Path, tree: &ScannedTree, eff: &Effective) -> ProjectModel {
    let mut model = ProjectModel::default();
    for s in &tree.skipped {
        model.findings.push(failed(
            "(root)",
            &s.path,
            format!("entry could not be scanned: {}", s.reason),
        ));
    }
    model.file_count = tree.files().len();

    model.base = detect_base(tree, eff);
    let base_nodes: Vec<&TreeNode> = if model.base.is_empty() {
        tree.nodes.iter().collect()
    } else {
        match tree.find(&model.base) {
            Some(n) if n.is_dir() => n.children.iter().collect(),
            _ => {
                model.findings.push(Violation::new(
                    RuleId::Structure,
                    ViolationKind::StructureViolation,
                    "(root)",
                    model.base.clone(),
                    "configured source root does not exist",
                ));
                Vec::new()
            }
        }
    };

    match base_nodes.iter().find(|n| n.name == "modules" && n.is_dir()) {
        Some(modules_dir) => build_modules(modules_dir, eff, &mut model),
        None => model.findings.push(Violation::new(
            RuleId::Structure,
            ViolationKind::StructureViolation,
            "modules",
            model.rooted("modules"),
            "project has no modules/ area",
        )),
    }

    load_sources(root, &base_nodes, eff, &mut model);
    index_declarations(eff, &mut model);
    load_schema(root, &base_nodes, eff, &mut model);
    info!(
        modules = model.all_modules().len(),
        sources = model.sources.len(),
        entities = model.entities.len(),
        migrations = model.migrations.len(),
        "model built"
    );
    model
}

fn detect_base(tree: &ScannedTree, eff: &Effective) -> String {
    if let Some(sr) = eff.layout.source_root.as_deref() {
        return sr.trim_matches('/').to_string();
    }
    let has = |name: &str| tree.nodes.iter().any(|n| n.name == name && n.is_dir());
    if !has("modules") && has("src") {
        "src".to_string()
    } else {
        String::new()
    }
}

/// Path relative to the source base.
fn base_rel<'a>(base: &str, path: &'a str) -> &'a str {
    if base.is_empty() {
        return path;
    }
    path.strip_prefix(base)
        .and_then(|p| p.strip_prefix('/'))
        .unwrap_or(path)
}

fn failed(module: &str, subject: &str, message: String) -> Violation {
    Violation::new(
        RuleId::Structure,
        ViolationKind::RuleEvaluationFailed,
        module,
        subject,
        message,
    )
}

/// Kebab-case: lowercase ASCII alphanumerics separated by single dashes.
pub fn is_kebab(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Classify a module file by its role suffix. Returns the role and the
/// prefix in front of `.<role>.<ext>`.
pub fn classify<'a>(file_name: &'a str, extensions: &[String]) -> Option<(Role, &'a str)> {
    for role in Role::ALL {
        for ext in extensions {
            let suffix = format!(".{}.{}", role.suffix(), ext);
            if file_name.len() > suffix.len() && file_name.ends_with(&suffix) {
                return Some((role, &file_name[..file_name.len() - suffix.len()]));
            }
        }
    }
    None
}

fn sorted(nodes: &[TreeNode]) -> Vec<&TreeNode> {
    let mut v: Vec<&TreeNode> = nodes.iter().collect();
    v.sort_by(|a, b| a.name.cmp(&b.name));
    v
}

fn build_modules(modules_dir: &TreeNode, eff: &Effective, model: &mut ProjectModel) {
    for node in sorted(&modules_dir.children) {
        if node.is_dir() {
            let desc = build_module(node, None, eff, model);
            if qualifies(&desc) {
                model.modules.push(desc);
            } else {
                model.findings.push(empty_module(&desc.name, &desc.dir));
            }
        } else {
            let allowed = eff.layout.is_allowed_module_file(&node.name);
            model.naming.push(NamingToken {
                path: node.path.clone(),
                segment: node.name.clone(),
                kind: NodeKind::File,
                module: "modules".to_string(),
                compliant: allowed,
                reason: (!allowed).then(|| "file sits outside any module folder".to_string()),
            });
        }
    }
}

fn qualifies(desc: &ModuleDescriptor) -> bool {
    !desc.roles.is_empty() || !desc.submodules.is_empty()
}

fn empty_module(name: &str, dir: &str) -> Violation {
    Violation::new(
        RuleId::Structure,
        ViolationKind::StructureViolation,
        name,
        dir,
        "empty or unclassified module: no role file and no module folder inside",
    )
}

fn build_module(
    node: &TreeNode,
    parent: Option<&str>,
    eff: &Effective,
    model: &mut ProjectModel,
) -> ModuleDescriptor {
    let name = match parent {
        Some(p) => format!("{}/{}", p, node.name),
        None => node.name.clone(),
    };
    let kebab = is_kebab(&node.name);
    model.naming.push(NamingToken {
        path: node.path.clone(),
        segment: node.name.clone(),
        kind: NodeKind::Directory,
        module: name.clone(),
        compliant: kebab,
        reason: (!kebab).then(|| "folder name is not kebab-case".to_string()),
    });

    let mut desc = ModuleDescriptor {
        name: name.clone(),
        leaf: node.name.clone(),
        dir: node.path.clone(),
        roles: Vec::new(),
        submodules: Vec::new(),
        unclassified: BTreeSet::new(),
    };
    for child in sorted(&node.children) {
        if child.is_dir() {
            if eff.layout.module_support_dirs.contains(&child.name) {
                continue;
            }
            let sub = build_module(child, Some(&name), eff, model);
            if qualifies(&sub) {
                desc.submodules.push(sub);
            } else {
                model.findings.push(empty_module(&sub.name, &sub.dir));
            }
            continue;
        }
        let token = match classify(&child.name, &eff.layout.extensions) {
            Some((role, prefix)) => {
                desc.roles.push((role, child.name.clone()));
                let ok = is_kebab(prefix);
                NamingToken {
                    path: child.path.clone(),
                    segment: child.name.clone(),
                    kind: NodeKind::File,
                    module: name.clone(),
                    compliant: ok,
                    reason: (!ok).then(|| format!("file prefix '{}' is not kebab-case", prefix)),
                }
            }
            None => {
                desc.unclassified.insert(child.name.clone());
                let ok = eff.layout.is_allowed_module_file(&child.name);
                NamingToken {
                    path: child.path.clone(),
                    segment: child.name.clone(),
                    kind: NodeKind::File,
                    module: name.clone(),
                    compliant: ok,
                    reason: (!ok).then(|| {
                        "file does not carry a recognized role suffix \
                         (.routes/.controller/.service/.validator/.types)"
                            .to_string()
                    }),
                    }
            }
        };
        model.naming.push(token);
    }
    desc.roles.sort();
    desc
}

fn is_test_file(rel: &str) -> bool {
    let name = rel.rsplit('/').next().unwrap_or(rel);
    name.contains(".test.") || name.contains(".spec.") || rel.split('/').any(|s| s == "__tests__")
}

fn load_sources(root: &Path, base_nodes: &[&TreeNode], eff: &Effective, model: &mut ProjectModel) {
    let mut files: Vec<&TreeNode> = base_nodes
        .iter()
        .flat_map(|n| n.walk())
        .filter(|n| !n.is_dir() && eff.layout.is_source(&n.name) && !is_test_file(&n.path))
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let owners: Vec<(String, String)> = model
        .all_modules()
        .into_iter()
        .map(|m| (m.dir.clone(), m.name.clone()))
        .collect();
    let role_files: BTreeMap<String, Role> = model
        .all_modules()
        .into_iter()
        .flat_map(|m| {
            m.roles
                .iter()
                .map(move |(r, f)| (format!("{}/{}", m.dir, f), *r))
        })
        .collect();

    let read: Vec<(String, Result<String, String>)> = files
        .par_iter()
        .map(|n| {
            let res = fs::read(root.join(&n.path))
                .map_err(|e| format!("cannot read file: {}", e))
                .and_then(|bytes| {
                    String::from_utf8(bytes).map_err(|_| "file is not valid UTF-8".to_string())
                });
            (n.path.clone(), res)
        })
        .collect();

    for (path, res) in read {
        let rel = base_rel(&model.base, &path);
        let area = Area::from_segment(rel.split('/').next().unwrap_or_default());
        // deepest module whose directory contains the file
        let module = owners
            .iter()
            .filter(|(dir, _)| path.starts_with(&format!("{}/", dir)))
            .max_by_key(|(dir, _)| dir.len())
            .map(|(_, name)| name.clone());
        match res {
            Ok(text) => model.sources.push(SourceFile {
                role: role_files.get(&path).copied(),
                path,
                area,
                module,
                text,
            }),
            Err(reason) => {
                let label = module.unwrap_or_else(|| area.label().to_string());
                model.findings.push(failed(&label, &path, reason));
            }
        }
    }
    debug!(count = model.sources.len(), "sources loaded");
}

fn index_declarations(eff: &Effective, model: &mut ProjectModel) {
    let constants_prefix = format!("{}/", eff.layout.constants_dir);
    let mut classes = BTreeMap::new();
    let mut literals = BTreeSet::new();
    for f in &model.sources {
        let rel = base_rel(&model.base, &f.path);
        if rel.starts_with(&constants_prefix) {
            literals.extend(source::declared_literals(&f.text));
        }
        for decl in source::class_decls(&f.text, &f.path) {
            classes.entry(decl.name.clone()).or_insert(decl);
        }
    }
    model.classes = classes;
    model.constant_literals = literals;
}

fn load_schema(root: &Path, base_nodes: &[&TreeNode], eff: &Effective, model: &mut ProjectModel) {
    let mut model_files = Vec::new();
    let mut migration_files = Vec::new();
    for n in base_nodes.iter().flat_map(|n| n.walk()) {
        if n.is_dir() {
            continue;
        }
        let rel = base_rel(&model.base, &n.path);
        if eff.layout.is_model(rel) {
            model_files.push(n.path.clone());
        } else if eff.layout.is_migration(rel) {
            migration_files.push(n.path.clone());
        }
    }
    model_files.sort();
    migration_files.sort();

    let mut entities: Vec<SchemaEntity> = Vec::new();
    for path in &model_files {
        let parsed = read_text(root, model, path).and_then(|t| schema::parse_model_file(path, &t));
        match parsed {
            Ok(found) => entities.extend(found),
            Err(reason) => model.findings.push(failed(
                "infrastructure",
                path,
                format!("schema declaration could not be parsed: {}", reason),
            )),
        }
    }
    for e in entities.iter_mut() {
        e.module = match_module(e, model);
    }

    let mut records: Vec<MigrationRecord> = Vec::new();
    for path in &migration_files {
        let filename = path.rsplit('/').next().unwrap_or(path);
        if !eff.layout.is_source(filename) {
            model.findings.push(failed(
                "infrastructure",
                path,
                "migration file type is not readable (expected a script migration)".to_string(),
            ));
            continue;
        }
        let parsed = read_text(root, model, path).and_then(|t| {
            migration::parse_migration_file(path, filename, &t)
        });
        match parsed {
            Ok(found) => records.extend(found),
            Err(reason) => model.findings.push(failed(
                "infrastructure",
                path,
                format!("migration could not be parsed: {}", reason),
            )),
        }
    }
    records.sort_by(MigrationRecord::chronological);

    model.entities = entities;
    model.migrations = records;
    model.migration_files = migration_files;
}

fn read_text(root: &Path, model: &ProjectModel, path: &str) -> Result<String, String> {
    if let Some(f) = model.sources.iter().find(|f| f.path == path) {
        return Ok(f.text.clone());
    }
    let bytes = fs::read(root.join(path)).map_err(|e| format!("cannot read file: {}", e))?;
    String::from_utf8(bytes).map_err(|_| "file is not valid UTF-8".to_string())
}

fn singular_key(s: &str) -> String {
    let k: String = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if let Some(stem) = k.strip_suffix("ies") {
        format!("{}y", stem)
    } else if let Some(stem) = k.strip_suffix('s') {
        stem.to_string()
    } else {
        k
    }
}

/// Module owning an entity: the module whose directory holds the model
/// file, else the first module whose name matches the table name
/// (case, separators and plural `s` ignored).
fn match_module(e: &SchemaEntity, model: &ProjectModel) -> Option<String> {
    let modules = model.all_modules();
    if let Some(m) = modules
        .iter()
        .filter(|m| e.path.starts_with(&format!("{}/", m.dir)))
        .max_by_key(|m| m.dir.len())
    {
        return Some(m.name.clone());
    }
    let key = singular_key(&e.table);
    modules
        .iter()
        .find(|m| singular_key(&m.leaf) == key)
        .map(|m| m.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::scan::scan;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }

    fn model_for(root: &Path) -> ProjectModel {
        let eff = Effective::defaults(root).unwrap();
        let tree = scan(root, &eff).unwrap();
        build_model(root, &tree, &eff)
    }

    #[test]
    fn test_kebab_and_classify() {
        assert!(is_kebab("purchase-orders"));
        assert!(is_kebab("v2"));
        assert!(!is_kebab("PurchaseOrders"));
        assert!(!is_kebab("purchase_orders"));
        assert!(!is_kebab("a--b"));
        let exts = vec!["ts".to_string()];
        assert_eq!(
            classify("inwards.controller.ts", &exts),
            Some((Role::Controller, "inwards"))
        );
        assert_eq!(classify("Inwards.Controller.ts", &exts), None);
        assert_eq!(classify(".routes.ts", &exts), None);
        assert_eq!(classify("inwards.routes.js", &exts), None);
    }

    #[test]
    fn test_modules_submodules_and_empty_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "modules/inwards/inwards.routes.ts", "");
        write(root, "modules/inwards/inwards.controller.ts", "");
        write(root, "modules/inwards/README.md", "# inwards");
        write(root, "modules/purchases/returns/returns.service.ts", "");
        write(root, "modules/purchases/dto/create.dto.ts", "");
        write(root, "modules/empty/notes.txt", "");

        let model = model_for(root);
        let names: Vec<&str> = model.all_modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["inwards", "purchases", "purchases/returns"]);

        let inwards = model.module("inwards").unwrap();
        assert!(inwards.is_leaf());
        assert_eq!(
            inwards.roles.iter().map(|(r, _)| *r).collect::<Vec<_>>(),
            vec![Role::Routes, Role::Controller]
        );
        assert!(inwards.unclassified.contains("README.md"));

        let purchases = model.module("purchases").unwrap();
        assert!(!purchases.is_leaf());

        assert!(model.findings.iter().any(|v| {
            v.kind == ViolationKind::StructureViolation && v.subject == "modules/empty"
        }));
        let txt = model
            .naming
            .iter()
            .find(|t| t.segment == "notes.txt")
            .unwrap();
        assert!(!txt.compliant);
    }

    #[test]
    fn test_sources_are_tagged_with_module_role_and_area() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "src/modules/inwards/inwards.controller.ts", "export class C {}");
        write(root, "src/modules/inwards/dto/in.dto.ts", "export type X = 1;");
        write(root, "src/config/index.ts", "export default process.env;");
        write(root, "src/modules/inwards/inwards.test.ts", "it('x')");

        let model = model_for(root);
        assert_eq!(model.base, "src");
        let ctrl = model
            .sources
            .iter()
            .find(|f| f.path == "src/modules/inwards/inwards.controller.ts")
            .unwrap();
        assert_eq!(ctrl.role, Some(Role::Controller));
        assert_eq!(ctrl.module.as_deref(), Some("inwards"));
        let dto = model
            .sources
            .iter()
            .find(|f| f.path.ends_with("in.dto.ts"))
            .unwrap();
        assert_eq!(dto.module.as_deref(), Some("inwards"));
        assert_eq!(dto.role, None);
        let cfg = model.sources.iter().find(|f| f.path == "src/config/index.ts").unwrap();
        assert_eq!(cfg.area, Area::Config);
        assert!(!model.sources.iter().any(|f| f.path.ends_with(".test.ts")));
    }

    #[test]
    fn test_schema_parse_failure_is_isolated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "infrastructure/database/models/good.model.ts",
            "Good.init({ id: { type: DataTypes.INTEGER, primaryKey: true } }, { tableName: 'good', paranoid: true });",
        );
        write(root, "infrastructure/database/models/bad.model.ts", "Bad.init({ id: ");
        write(
            root,
            "infrastructure/database/migrations/20240101000000-create-good.ts",
            "export async function up(q) { await q.createTable('good', { id: { primaryKey: true } }); }",
        );
        write(root, "infrastructure/database/migrations/notes.md", "x");

        let model = model_for(root);
        assert_eq!(model.entities.len(), 1);
        assert_eq!(model.migrations.len(), 1);
        assert_eq!(model.migration_files.len(), 2);
        let failures: Vec<&Violation> = model
            .findings
            .iter()
            .filter(|v| v.kind == ViolationKind::RuleEvaluationFailed)
            .collect();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().any(|v| v.subject.ends_with("bad.model.ts")));
        assert!(failures.iter().any(|v| v.subject.ends_with("notes.md")));
    }

    #[test]
    fn test_non_utf8_source_degrades_to_warning() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "modules/a/a.routes.ts", "Order.findAll();\n");
        let bad = root.join("modules/a/a.service.ts");
        fs::write(&bad, b"const x = '\xff';").unwrap();

        let eff = Effective::defaults(root).unwrap();
        let tree = scan(root, &eff).unwrap();
        let model = build_model(root, &tree, &eff);
        assert!(model.sources.iter().all(|f| f.path != "modules/a/a.service.ts"));

        let found = crate::rules::run_rules(&model, &eff);
        let failed: Vec<&Violation> = found
            .iter()
            .filter(|v| v.kind == ViolationKind::RuleEvaluationFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].subject, "modules/a/a.service.ts");
        assert_eq!(failed[0].severity, Severity::Warning);
        assert_eq!(failed[0].module, "a");
        assert!(found
            .iter()
            .any(|v| v.kind == ViolationKind::LayeringViolation && v.subject == "modules/a/a.routes.ts"));
    }

    fn reverse(nodes: &mut [TreeNode]) {
        nodes.reverse();
        for n in nodes.iter_mut() {
            reverse(&mut n.children);
        }
    }

    #[test]
    fn test_model_is_independent_of_traversal_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "modules/b-mod/b-mod.routes.ts", "");
        write(root, "modules/a-mod/a-mod.service.ts", "");
        write(root, "modules/a-mod/inner/inner.types.ts", "");
        write(root, "modules/a-mod/Stray.ts", "");
        write(root, "common/errors/app.error.ts", "export class AppError extends BaseError {}");
        let eff = Effective::defaults(root).unwrap();
        let tree = scan(root, &eff).unwrap();
        let forward = build_model(root, &tree, &eff);
        let mut shuffled = tree.clone();
        reverse(&mut shuffled.nodes);
        let backward = build_model(root, &shuffled, &eff);

        assert_eq!(forward.modules, backward.modules);
        assert_eq!(forward.naming, backward.naming);
        assert_eq!(forward.findings, backward.findings);
        assert_eq!(
            forward.sources.iter().map(|f| &f.path).collect::<Vec<_>>(),
            backward.sources.iter().map(|f| &f.path).collect::<Vec<_>>()
        );
        assert_eq!(forward.classes, backward.classes);
    }

    #[test]
    fn test_entity_module_matching() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "modules/purchase-orders/purchase-orders.routes.ts", "");
        write(
            root,
            "infrastructure/database/models/purchase-order.model.ts",
            "PurchaseOrder.init({ id: DataTypes.INTEGER }, { tableName: 'purchase_order' });",
        );
        let model = model_for(root);
        assert_eq!(model.entities[0].module.as_deref(), Some("purchase-orders"));
    }
}
