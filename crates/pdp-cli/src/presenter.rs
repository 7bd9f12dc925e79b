//! CLI result presenter.

use pdp_core::task::TaskResult;
use pdp_orchestration::{BatchReport, ResultPresenter};

use crate::output::{format_counts, format_duration, format_failure};
use crate::ui::{print_error, print_header, print_success, print_warning};

/// Prints stage summaries to stdout and problems to stderr.
pub struct CliResultPresenter {
    quiet: bool,
}

impl CliResultPresenter {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ResultPresenter for CliResultPresenter {
    fn present_batch(&self, report: &BatchReport) {
        let failures = report.failures();
        if !self.quiet {
            print_header(&report.stage);
            println!(
                "{} in {}",
                format_counts(report),
                format_duration(report.duration)
            );
            if failures.is_empty() {
                print_success(&format!("{} complete", report.stage));
            }
        }
        self.present_failures(&report.stage, &failures);
    }

    fn present_failures(&self, stage: &str, failures: &[&TaskResult]) {
        if failures.is_empty() {
            return;
        }
        print_error(&format!("{} {stage} task(s) failed:", failures.len()));
        for failure in failures {
            eprintln!("  {}", format_failure(failure));
        }
    }

    fn present_warnings(&self, warnings: &[String]) {
        for warning in warnings {
            print_warning(warning);
        }
    }

    fn present_error(&self, error: &str) {
        print_error(error);
    }
}
