//! Completion checks that make dispatch idempotent.
//!
//! The default policy, [`OutputExists`], treats any existing output file as
//! complete, including zero-byte or truncated files left behind by an
//! interrupted run. [`NonEmptyOutput`] is an opt-in stricter policy.

use std::sync::Arc;

use crate::task::Task;

/// Decides whether a task's work has already been done.
pub trait CompletionChecker: Send + Sync {
    /// True if the task can be skipped.
    fn is_complete(&self, task: &Task) -> bool;

    /// Short policy name for logs.
    fn name(&self) -> &str;
}

/// Complete iff the expected output path exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputExists;

impl CompletionChecker for OutputExists {
    fn is_complete(&self, task: &Task) -> bool {
        task.expected_output().exists()
    }

    fn name(&self) -> &str {
        "exists"
    }
}

/// Complete iff the expected output is a file with at least one byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmptyOutput;

impl CompletionChecker for NonEmptyOutput {
    fn is_complete(&self, task: &Task) -> bool {
        std::fs::metadata(task.expected_output())
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "non-empty"
    }
}

/// Select a completion policy.
#[must_use]
pub fn checker_for(strict: bool) -> Arc<dyn CompletionChecker> {
    if strict {
        Arc::new(NonEmptyOutput)
    } else {
        Arc::new(OutputExists)
    }
}
