//! Tree scanner.
//!
//! Walks the project root once and produces an immutable [`ScannedTree`].
//! Ignored entries (logs, dependency artifacts, VCS directories, generated
//! files, plus any configured patterns) are pruned before descending. The
//! scanner only reads; it never writes into the inspected tree.

use crate::config::Effective;
use crate::error::ScanError;
use crate::models::project::{NodeKind, ScannedTree, SkippedEntry, TreeNode};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Scan `root`, honoring the ignore list in `eff`.
///
/// Fails only when the root itself is missing, not a directory or
/// unreadable. Unreadable entries below the root are returned as
/// [`SkippedEntry`] values.
pub fn scan(root: &Path, eff: &Effective) -> Result<ScannedTree, ScanError> {
    let meta = fs::metadata(root).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ScanError::Missing(root.to_path_buf())
        } else {
            ScanError::Unreadable {
                path: root.to_path_buf(),
                source,
            }
        }
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|source| ScanError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut nodes: Vec<TreeNode> = Vec::new();
    let mut skipped: Vec<SkippedEntry> = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let rel = relative(root, e.path());
            let name = e.file_name().to_string_lossy();
            !eff.is_ignored(&name, &rel)
        });
    for entry in walker {
        match entry {
            Ok(e) => {
                let rel = relative(root, e.path());
                let kind = if e.file_type().is_dir() {
                    NodeKind::Directory
                } else {
                    NodeKind::File
                };
                let parts: Vec<&str> = rel.split('/').collect();
                insert(&mut nodes, &parts, &rel, kind);
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| relative(root, p))
                    .unwrap_or_default();
                warn!(path = %path, error = %err, "skipping unreadable entry");
                skipped.push(SkippedEntry {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }
    sort_nodes(&mut nodes);
    debug!(entries = nodes.iter().map(|n| n.walk().len()).sum::<usize>(), "scan complete");
    Ok(ScannedTree { nodes, skipped })
}

/// Root-relative path with `/` separators regardless of platform.
pub fn relative(root: &Path, path: &Path) -> String {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn insert(nodes: &mut Vec<TreeNode>, parts: &[&str], full: &str, kind: NodeKind) {
    let Some((head, rest)) = parts.split_first() else {
        return;
    };
    if rest.is_empty() {
        if let Some(existing) = nodes.iter_mut().find(|n| n.name == *head) {
            existing.kind = kind;
            return;
        }
        nodes.push(TreeNode {
            path: full.to_string(),
            name: head.to_string(),
            kind,
            children: Vec::new(),
        });
        return;
    }
    let idx = match nodes.iter().position(|n| n.name == *head) {
        Some(i) => i,
        None => {
            let consumed = full.len() - rest.iter().map(|r| r.len() + 1).sum::<usize>();
            nodes.push(TreeNode {
                path: full[..consumed].to_string(),
                name: head.to_string(),
                kind: NodeKind::Directory,
                children: Vec::new(),
            });
            nodes.len() - 1
        }
    };
    insert(&mut nodes[idx].children, rest, full, kind);
}

fn sort_nodes(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    for n in nodes.iter_mut() {
        sort_nodes(&mut n.children);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scan_builds_sorted_tree_and_prunes_ignored() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("modules/inwards")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("logs")).unwrap();
        fs::write(root.join("modules/inwards/inwards.routes.ts"), "").unwrap();
        fs::write(root.join("modules/inwards/b.ts"), "").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join("logs/app.log"), "").unwrap();
        fs::write(root.join("api.generated.ts"), "").unwrap();

        let eff = Effective::defaults(root).unwrap();
        let tree = scan(root, &eff).unwrap();
        let names: Vec<&str> = tree.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["modules"]);
        let module = tree.find("modules/inwards").unwrap();
        assert!(module.is_dir());
        let files: Vec<&str> = module.children.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(
            files,
            vec!["modules/inwards/b.ts", "modules/inwards/inwards.routes.ts"]
        );
    }

    #[test]
    fn test_scan_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent");
        let eff = Effective::defaults(&missing).unwrap();
        assert!(matches!(scan(&missing, &eff), Err(ScanError::Missing(_))));
    }

    #[test]
    fn test_scan_file_root_is_fatal() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        let eff = Effective::defaults(&file).unwrap();
        assert!(matches!(scan(&file, &eff), Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn test_relative_uses_forward_slashes() {
        let root = Path::new("/a/b");
        assert_eq!(relative(root, Path::new("/a/b/c/d.ts")), "c/d.ts");
    }
}
