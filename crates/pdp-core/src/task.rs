//! Task descriptors and per-task results.
//!
//! A [`Task`] is one external command together with the file it is expected
//! to produce. The dispatcher turns every task into exactly one [`TaskResult`],
//! carrying the task's identifier so results can be re-associated with their
//! origin regardless of completion order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One independently executable unit of pipeline work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    identifier: String,
    command: String,
    expected_output: PathBuf,
}

impl Task {
    /// Create a task. The identifier must be unique within a batch.
    pub fn new(
        identifier: impl Into<String>,
        command: impl Into<String>,
        expected_output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            command: command.into(),
            expected_output: expected_output.into(),
        }
    }

    /// Stable identifier used as the join key for results.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Shell command line.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Path the command is expected to create.
    #[must_use]
    pub fn expected_output(&self) -> &Path {
        &self.expected_output
    }
}

/// Terminal state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// The command ran and exited zero.
    Succeeded,
    /// The output already existed; the command was not run.
    Skipped,
    /// The command could not be started or exited non-zero.
    Failed,
}

impl TaskStatus {
    /// Skipped tasks count as successful.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Succeeded | Self::Skipped)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Succeeded => "OK",
            Self::Skipped => "SKIPPED",
            Self::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// Outcome of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Identifier of the originating task.
    pub identifier: String,
    /// Terminal status.
    pub status: TaskStatus,
    /// Expected output location of the originating task.
    pub output_path: PathBuf,
    /// Exit code and tail of captured output, for failures.
    pub error_detail: Option<String>,
    /// Wall-clock time spent executing (zero for skipped tasks).
    pub duration: Duration,
}

impl TaskResult {
    /// Result for a task whose command exited zero.
    #[must_use]
    pub fn succeeded(task: &Task, duration: Duration) -> Self {
        Self {
            identifier: task.identifier.clone(),
            status: TaskStatus::Succeeded,
            output_path: task.expected_output.clone(),
            error_detail: None,
            duration,
        }
    }

    /// Result for a task whose output was already present.
    #[must_use]
    pub fn skipped(task: &Task) -> Self {
        Self {
            identifier: task.identifier.clone(),
            status: TaskStatus::Skipped,
            output_path: task.expected_output.clone(),
            error_detail: None,
            duration: Duration::ZERO,
        }
    }

    /// Result for a task that failed.
    #[must_use]
    pub fn failed(task: &Task, detail: impl Into<String>, duration: Duration) -> Self {
        Self {
            identifier: task.identifier.clone(),
            status: TaskStatus::Failed,
            output_path: task.expected_output.clone(),
            error_detail: Some(detail.into()),
            duration,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
