//! Report rendering.
//!
//! Supports `text` (default) and `json`. Both renderers are pure functions of
//! the report, so identical reports always render to identical bytes.

use crate::config::OutputFormat;
use crate::models::Severity;
use crate::report::{CompletionState, Report};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::fmt::Write as _;

/// Print the report to stdout in the requested format.
pub fn print_report(report: &Report, format: OutputFormat, color: bool) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&compose_report_json(report)) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} {}", crate::utils::error_prefix(false), e),
        },
        OutputFormat::Text => print!("{}", render_text(report, color)),
    }
}

fn paint(text: &str, color: bool, f: impl Fn(&str) -> String) -> String {
    if color {
        f(text)
    } else {
        text.to_string()
    }
}

/// Human-readable report: one line per violation, module status lines and
/// a summary line.
pub fn render_text(report: &Report, color: bool) -> String {
    let mut out = String::new();
    for v in &report.violations {
        let (icon, sev) = match v.severity {
            Severity::Error => (
                paint("✖", color, |s| s.red().to_string()),
                paint("⟦error⟧", color, |s| s.red().bold().to_string()),
            ),
            Severity::Warning => (
                paint("▲", color, |s| s.yellow().to_string()),
                paint("⟦warn⟧", color, |s| s.yellow().bold().to_string()),
            ),
        };
        let file = paint(v.file(), color, |s| s.bold().to_string());
        let _ = writeln!(out, "{} {} {} ❲{}❳ — {}", icon, sev, file, v.rule, v.message);
    }
    if !report.violations.is_empty() && !report.modules.is_empty() {
        out.push('\n');
    }
    for m in &report.modules {
        let state = match m.state {
            CompletionState::Complete => paint("Complete", color, |s| s.green().to_string()),
            CompletionState::Incomplete => paint("Incomplete", color, |s| s.yellow().to_string()),
        };
        let mut line = format!("◆ {} {}", m.module, state);
        if !m.missing.is_empty() {
            let missing: Vec<&str> = m.missing.iter().map(|i| i.as_str()).collect();
            let _ = write!(line, " (missing: {})", missing.join(", "));
        }
        let _ = writeln!(out, "{}", line);
    }
    let s = &report.summary;
    let summary = format!(
        "— Summary — errors={} warnings={} modules={} complete={} files={}",
        s.errors, s.warnings, s.modules, s.complete, s.files
    );
    let _ = writeln!(out, "{}", paint(&summary, color, |s| s.bold().to_string()));
    out
}

/// Compose the report JSON object (pure).
pub fn compose_report_json(report: &Report) -> JsonVal {
    let violations: Vec<_> = report
        .violations
        .iter()
        .map(|v| {
            json!({
                "module": v.module,
                "file": v.file(),
                "subject": v.subject,
                "rule": v.rule,
                "kind": v.kind,
                "severity": v.severity,
                "message": v.message,
            })
        })
        .collect();
    let modules: Vec<_> = report
        .modules
        .iter()
        .map(|m| {
            json!({
                "module": m.module,
                "status": m.state.as_str(),
                "satisfiedChecklistItems": m.satisfied,
                "missingChecklistItems": m.missing,
            })
        })
        .collect();
    let s = &report.summary;
    json!({
        "violations": violations,
        "modules": modules,
        "summary": {
            "errors": s.errors,
            "warnings": s.warnings,
            "modules": s.modules,
            "complete": s.complete,
            "files": s.files,
        },
    })
}
