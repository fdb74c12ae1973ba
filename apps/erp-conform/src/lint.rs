//! Validation runner: scan, build the model, evaluate rules, report.
//!
//! Only scanning can fail the run as a whole. Configuration is resolved by
//! the caller; everything that goes wrong afterwards ends up in the report.

use crate::build::build_model;
use crate::config::Effective;
use crate::error::FatalError;
use crate::report::{generate, Report};
use crate::rules::run_rules;
use crate::scan::scan;
use tracing::{debug, info};

/// Validate the project tree at `eff.root`.
pub fn run_validate(eff: &Effective) -> Result<Report, FatalError> {
    info!(root = %eff.root.display(), "scanning");
    let tree = scan(&eff.root, eff)?;
    debug!(skipped = tree.skipped.len(), "scan complete");

    let model = build_model(&eff.root, &tree, eff);
    let raw = run_rules(&model, eff);
    debug!(raw = raw.len(), "rules evaluated");

    let report = generate(&model, raw);
    info!(
        errors = report.summary.errors,
        warnings = report.summary.warnings,
        modules = report.summary.modules,
        "validation finished"
    );
    Ok(report)
}
