//! Structural model of a scanned project: tree nodes, module descriptors,
//! naming tokens, source files and the declarations indexed from them.

use super::schema::{MigrationRecord, SchemaEntity};
use super::{Role, Violation};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One entry of the scanned tree. `path` is root-relative with `/` separators.
pub struct TreeNode {
    pub path: String,
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Depth-first walk over this node and all descendants.
    pub fn walk(&self) -> Vec<&TreeNode> {
        let mut out = vec![self];
        for c in &self.children {
            out.extend(c.walk());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An entry below the root that could not be read during the scan.
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
/// Scanner output: top-level nodes of the root, sorted by name.
pub struct ScannedTree {
    pub nodes: Vec<TreeNode>,
    pub skipped: Vec<SkippedEntry>,
}

impl ScannedTree {
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let first = parts.next()?;
        let mut cur = self.nodes.iter().find(|n| n.name == first)?;
        for p in parts {
            cur = cur.child(p)?;
        }
        Some(cur)
    }

    pub fn files(&self) -> Vec<&TreeNode> {
        self.nodes
            .iter()
            .flat_map(|n| n.walk())
            .filter(|n| !n.is_dir())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Conventional top-level area a file belongs to.
pub enum Area {
    Api,
    Bootstrap,
    Common,
    Config,
    Infrastructure,
    Modules,
    Other,
}

impl Area {
    pub fn from_segment(seg: &str) -> Self {
        match seg {
            "api" => Area::Api,
            "bootstrap" => Area::Bootstrap,
            "common" => Area::Common,
            "config" => Area::Config,
            "infrastructure" => Area::Infrastructure,
            "modules" => Area::Modules,
            _ => Area::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Area::Api => "api",
            Area::Bootstrap => "bootstrap",
            Area::Common => "common",
            Area::Config => "config",
            Area::Infrastructure => "infrastructure",
            Area::Modules => "modules",
            Area::Other => "(root)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A domain module under `modules/`.
///
/// `name` is qualified (`purchases/returns`) for submodules; `leaf` is the
/// directory name. A descriptor without submodules must carry every role.
pub struct ModuleDescriptor {
    pub name: String,
    pub leaf: String,
    pub dir: String,
    pub roles: Vec<(Role, String)>,
    pub submodules: Vec<ModuleDescriptor>,
    pub unclassified: BTreeSet<String>,
}

impl ModuleDescriptor {
    pub fn is_leaf(&self) -> bool {
        self.submodules.is_empty()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|(r, _)| *r == role)
    }

    /// This descriptor followed by all nested submodules, depth-first.
    pub fn flatten(&self) -> Vec<&ModuleDescriptor> {
        let mut out = vec![self];
        for s in &self.submodules {
            out.extend(s.flatten());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A path segment under `modules/` tagged against the naming rules.
pub struct NamingToken {
    pub path: String,
    pub segment: String,
    pub kind: NodeKind,
    pub module: String,
    pub compliant: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
/// A readable source file with its position in the layout.
pub struct SourceFile {
    pub path: String,
    pub area: Area,
    pub module: Option<String>,
    pub role: Option<Role>,
    pub text: String,
}

impl SourceFile {
    /// Module a finding in this file is reported under.
    pub fn module_label(&self) -> String {
        match &self.module {
            Some(m) => m.clone(),
            None => self.area.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub extends: Option<String>,
    pub path: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
/// Everything the rules and the parity checker consume. Built once, then
/// shared read-only across workers.
pub struct ProjectModel {
    /// Root-relative prefix of the source base (`""` or e.g. `"src"`).
    pub base: String,
    pub modules: Vec<ModuleDescriptor>,
    pub naming: Vec<NamingToken>,
    pub sources: Vec<SourceFile>,
    pub classes: BTreeMap<String, ClassDecl>,
    pub constant_literals: BTreeSet<String>,
    pub entities: Vec<SchemaEntity>,
    pub migrations: Vec<MigrationRecord>,
    /// Root-relative paths of every file in the migrations location,
    /// parseable or not.
    pub migration_files: Vec<String>,
    /// Findings raised while building (structure and parse failures).
    pub findings: Vec<Violation>,
    pub file_count: usize,
}

impl ProjectModel {
    pub fn all_modules(&self) -> Vec<&ModuleDescriptor> {
        self.modules.iter().flat_map(|m| m.flatten()).collect()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.all_modules().into_iter().find(|m| m.name == name)
    }

    /// Base-relative path joined onto the root-relative base prefix.
    pub fn rooted(&self, rel: &str) -> String {
        if self.base.is_empty() {
            rel.to_string()
        } else {
            format!("{}/{}", self.base, rel)
        }
    }
}
