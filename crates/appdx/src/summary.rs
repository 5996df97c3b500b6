//! End-of-run summary printed on stdout.

use std::fmt::Write as _;

use owo_colors::OwoColorize;

use appdx_core::{ExportReport, MigrationReport};

/// Applies colour only when the console wants it.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    color: bool,
}

impl Painter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn ok(self, text: &str) -> String {
        if self.color { text.green().bold().to_string() } else { text.to_owned() }
    }

    fn warn(self, text: &str) -> String {
        if self.color { text.yellow().bold().to_string() } else { text.to_owned() }
    }

    fn bad(self, text: &str) -> String {
        if self.color { text.red().bold().to_string() } else { text.to_owned() }
    }

    fn dim(self, text: &str) -> String {
        if self.color { text.dimmed().to_string() } else { text.to_owned() }
    }
}

pub fn export_summary(report: &ExportReport, paint: Painter) -> String {
    let mut out = String::new();
    let status = if report.warnings.is_empty() {
        paint.ok("Export complete")
    } else {
        paint.warn("Export complete with warnings")
    };
    let _ = writeln!(out, "{status}: {} file(s) written", report.written.len());
    let _ = writeln!(out, "  {} {}", paint.dim("output:"), report.root.display());
    for warning in &report.warnings {
        let _ = writeln!(out, "  {} {warning}", paint.warn("warning:"));
    }
    out
}

pub fn migration_summary(report: &MigrationReport, paint: Painter) -> String {
    let mut out = String::new();
    let status = if report.skipped.is_empty() && report.failed.is_empty() {
        paint.ok("Migration complete")
    } else {
        paint.warn("Migration complete with problems")
    };
    let _ = writeln!(
        out,
        "{status}: {} migrated, {} skipped, {} failed",
        report.migrated.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for name in &report.migrated {
        let _ = writeln!(out, "  {} {name}", paint.ok("migrated:"));
    }
    for name in &report.skipped {
        let _ = writeln!(out, "  {} {name} (no matching destination application)", paint.warn("skipped:"));
    }
    for name in &report.failed {
        let _ = writeln!(out, "  {} {name}", paint.bad("failed:"));
    }
    out
}
