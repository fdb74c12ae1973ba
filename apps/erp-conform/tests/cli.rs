use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cmd() -> Command {
    cargo_bin_cmd!("erp-conform")
}

fn write(root: &Path, rel: &str, body: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().expect("parent")).expect("create dirs");
    fs::write(p, body).expect("write fixture");
}

/// A module carrying every role, documented, with nothing to report.
fn clean_project() -> TempDir {
    let tmp = TempDir::new().expect("create temp dir");
    let root = tmp.path();
    for role in ["routes", "controller", "service", "validator", "types"] {
        write(
            root,
            &format!("modules/inwards/inwards.{}.ts", role),
            "export {};\n",
        );
    }
    write(root, "modules/inwards/README.md", "# Inwards\n");
    tmp
}

#[test]
fn version_prints_package_version() {
    cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn clean_project_exits_zero() {
    let tmp = clean_project();
    cmd()
        .args(["validate", "--color", "never"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(contains("◆ inwards Complete"))
        .stdout(contains("errors=0 warnings=0 modules=1 complete=1"));
}

#[test]
fn missing_roles_fail_with_naming_violations() {
    let tmp = TempDir::new().expect("create temp dir");
    let root = tmp.path();
    write(root, "modules/inwards/inwards.routes.ts", "export {};\n");
    write(root, "modules/inwards/inwards.controller.ts", "export {};\n");
    cmd()
        .args(["validate", "--color=never"])
        .arg(root)
        .assert()
        .code(1)
        .stdout(contains("modules/inwards/inwards.service.ts ❲naming❳"))
        .stdout(contains("modules/inwards/inwards.validator.ts ❲naming❳"))
        .stdout(contains("modules/inwards/inwards.types.ts ❲naming❳"))
        .stdout(contains("◆ inwards Incomplete"));
}

#[test]
fn json_report_shape() {
    let tmp = TempDir::new().expect("create temp dir");
    let root = tmp.path();
    write(root, "modules/inwards/inwards.routes.ts", "export {};\n");
    let out = cmd()
        .args(["validate", "--format", "json"])
        .arg(root)
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(1));
    let v: Value = serde_json::from_slice(&out.stdout).expect("valid json");
    assert!(v["violations"].as_array().expect("array").len() >= 4);
    assert_eq!(v["violations"][0]["module"], "inwards");
    assert_eq!(v["modules"][0]["module"], "inwards");
    assert_eq!(v["modules"][0]["status"], "Incomplete");
    assert_eq!(v["summary"]["modules"], 1);
    let text = String::from_utf8(out.stdout).expect("utf8");
    assert!(!text.contains(&root.display().to_string()));
}

#[test]
fn warnings_fail_only_below_threshold() {
    let tmp = clean_project();
    write(
        tmp.path(),
        "modules/inwards/inwards.service.ts",
        "export const state = 'AWAITING_QC';\n",
    );
    cmd()
        .args(["validate", "--color", "never"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(contains("⟦warn⟧"));
    cmd()
        .args(["validate", "--color", "never", "--fail-on", "warning"])
        .arg(tmp.path())
        .assert()
        .code(1);
}

#[test]
fn missing_root_is_fatal() {
    let tmp = TempDir::new().expect("create temp dir");
    cmd()
        .args(["validate", "--color", "never"])
        .arg(tmp.path().join("nope"))
        .assert()
        .code(2)
        .stderr(contains("✖ error:"))
        .stderr(contains("does not exist"));
}

#[test]
fn unknown_rule_is_fatal() {
    let tmp = clean_project();
    cmd()
        .args(["validate", "--color", "never", "--rules", "naming,bogus"])
        .arg(tmp.path())
        .assert()
        .code(2)
        .stderr(contains("unknown rule id 'bogus'"));
}

#[test]
fn rule_selection_and_config_file() {
    let tmp = TempDir::new().expect("create temp dir");
    let root = tmp.path();
    write(root, "modules/inwards/inwards.routes.ts", "Inward.findAll();\n");
    cmd()
        .args(["validate", "--color", "never", "--rules", "layering"])
        .arg(root)
        .assert()
        .code(1)
        .stdout(contains("❲layering❳"))
        .stdout(contains("❲naming❳").not());

    write(
        root,
        "erp-conform.toml",
        "disabled = [\"naming\", \"documentation\"]\n\n[severity]\nlayering = \"warning\"\n",
    );
    cmd()
        .args(["validate", "--color", "never"])
        .arg(root)
        .assert()
        .success()
        .stdout(contains("⟦warn⟧ modules/inwards/inwards.routes.ts ❲layering❳"));
}

#[test]
fn output_is_identical_across_runs() {
    let tmp = TempDir::new().expect("create temp dir");
    let root = tmp.path();
    write(root, "modules/b/b.routes.ts", "Order.findAll();\n");
    write(root, "modules/a/a.service.ts", "const x = process.env.X;\n");
    write(root, "common/helpers.ts", "throw new Error('x');\n");
    let run = || {
        cmd()
            .args(["validate", "--format", "json"])
            .arg(root)
            .output()
            .expect("run")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn verbose_logs_follow_color_flag() {
    let tmp = clean_project();
    cmd()
        .args(["validate", "--color", "never", "-v"])
        .arg(tmp.path())
        .assert()
        .success()
        .stderr(contains("scanning"))
        .stderr(contains("\u{1b}[").not());
}
