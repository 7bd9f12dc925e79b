//! Orchestration interfaces.

use pdp_core::task::{Task, TaskResult};

use crate::dispatcher::{BatchReport, DispatchConfig};

/// Trait for reporting batch progress to the user.
pub trait ProgressReporter: Send + Sync {
    /// A batch of `total` tasks is about to run.
    fn start(&self, stage: &str, total: usize);

    /// One task reached a terminal state.
    fn report(&self, result: &TaskResult);

    /// Report completion of the batch.
    fn complete(&self);
}

/// Trait for presenting stage outcomes.
pub trait ResultPresenter: Send + Sync {
    /// Summarise one finished batch, failures included.
    fn present_batch(&self, report: &BatchReport);

    /// List failed tasks with their captured error text.
    fn present_failures(&self, stage: &str, failures: &[&TaskResult]);

    /// Data-integrity warnings that did not fail a task.
    fn present_warnings(&self, warnings: &[String]);

    /// Present a fatal error.
    fn present_error(&self, error: &str);
}

/// Something that can run a batch of commands to completion.
///
/// Implementations block until every task has terminated and return exactly
/// one result per task, in submission order.
pub trait ExecutionBackend: Send + Sync {
    /// Submit `tasks` and wait for all of them.
    fn submit(
        &self,
        tasks: &[Task],
        config: &DispatchConfig,
        reporter: &dyn ProgressReporter,
    ) -> Vec<TaskResult>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// Null progress reporter (does nothing).
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn start(&self, _stage: &str, _total: usize) {}
    fn report(&self, _result: &TaskResult) {}
    fn complete(&self) {}
}
