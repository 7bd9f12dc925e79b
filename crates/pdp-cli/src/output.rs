//! CLI output formatting.

use std::time::Duration;

use pdp_core::task::{TaskResult, TaskStatus};
use pdp_orchestration::BatchReport;

/// Format a duration for display.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.0}s")
    } else {
        let hours = (secs / 3600.0).floor() as u64;
        let mins = ((secs - hours as f64 * 3600.0) / 60.0).floor() as u64;
        format!("{hours}h{mins:02}m")
    }
}

/// One-line status count for a batch, e.g. `5 tasks: 3 ran, 1 skipped, 1 failed`.
#[must_use]
pub fn format_counts(report: &BatchReport) -> String {
    let noun = if report.results.len() == 1 { "task" } else { "tasks" };
    format!(
        "{} {noun}: {} ran, {} skipped, {} failed",
        report.results.len(),
        report.count(TaskStatus::Succeeded),
        report.count(TaskStatus::Skipped),
        report.count(TaskStatus::Failed)
    )
}

/// Identifier and indented error detail of a failed task.
#[must_use]
pub fn format_failure(result: &TaskResult) -> String {
    let mut out = result.identifier.clone();
    if let Some(detail) = result.error_detail.as_deref() {
        for line in detail.lines() {
            out.push_str("\n    ");
            out.push_str(line);
        }
    }
    out
}
