//! Batch progress bar.

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

use pdp_core::task::TaskResult;
use pdp_orchestration::ProgressReporter;

const TEMPLATE: &str = "{spinner} {msg:<12} [{bar:40}] {pos}/{len} ({elapsed}, ETA {eta})";

/// Progress reporter drawing one bar per batch on stderr.
///
/// Failed tasks are printed above the bar as they happen; the bar is cleared
/// when the batch completes.
pub struct BatchProgressReporter {
    enabled: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl BatchProgressReporter {
    /// A disabled reporter keeps counting on a hidden bar.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(bar) = self.bar.lock().as_ref() {
            f(bar);
        }
    }

    /// Position of the current bar, if a batch has started.
    #[must_use]
    pub fn position(&self) -> Option<u64> {
        self.bar.lock().as_ref().map(ProgressBar::position)
    }
}

impl ProgressReporter for BatchProgressReporter {
    fn start(&self, stage: &str, total: usize) {
        let bar = if self.enabled {
            let style = ProgressStyle::default_bar()
                .template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
            let bar = ProgressBar::new(total as u64);
            bar.set_style(style);
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_length(total as u64);
        bar.set_message(stage.to_string());
        *self.bar.lock() = Some(bar);
    }

    fn report(&self, result: &TaskResult) {
        self.with_bar(|bar| {
            if !result.is_success() {
                bar.println(format!("failed: {}", result.identifier));
            }
            bar.inc(1);
        });
    }

    fn complete(&self) {
        self.with_bar(ProgressBar::finish_and_clear);
    }
}
