//! Idempotent, fail-at-end batch dispatch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pdp_core::completion::{CompletionChecker, OutputExists};
use pdp_core::error::{PdpError, Result};
use pdp_core::task::{Task, TaskResult, TaskStatus};

use crate::backend::LocalBackend;
use crate::interfaces::{ExecutionBackend, NullProgressReporter, ProgressReporter};

/// Explicit execution settings for a dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of tasks in flight.
    pub concurrency: usize,
    /// Directory commands run in; relative output paths resolve against it.
    pub workdir: PathBuf,
}

impl DispatchConfig {
    #[must_use]
    pub fn new(concurrency: usize, workdir: impl Into<PathBuf>) -> Self {
        Self {
            concurrency: concurrency.max(1),
            workdir: workdir.into(),
        }
    }

    /// Number of available processing cores.
    #[must_use]
    pub fn default_concurrency() -> usize {
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }
}

/// Results of one batch, in submission order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub stage: String,
    pub results: Vec<TaskResult>,
    pub duration: Duration,
}

impl BatchReport {
    /// True when no task failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.results.iter().all(TaskResult::is_success)
    }

    /// Failed results, sorted by identifier.
    #[must_use]
    pub fn failures(&self) -> Vec<&TaskResult> {
        let mut failed: Vec<&TaskResult> =
            self.results.iter().filter(|r| !r.is_success()).collect();
        failed.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        failed
    }

    #[must_use]
    pub fn count(&self, status: TaskStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Filters completed tasks and hands the rest to a backend.
pub struct Dispatcher {
    backend: Arc<dyn ExecutionBackend>,
    checker: Arc<dyn CompletionChecker>,
    config: DispatchConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        backend: Arc<dyn ExecutionBackend>,
        checker: Arc<dyn CompletionChecker>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            backend,
            checker,
            config,
        }
    }

    /// Local backend, existence-based completion.
    #[must_use]
    pub fn local(config: DispatchConfig) -> Self {
        Self::new(Arc::new(LocalBackend), Arc::new(OutputExists), config)
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Resolve a task output path against the working directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.config.workdir.join(path)
    }

    /// Run a batch without progress reporting.
    pub fn run(&self, stage: &str, tasks: &[Task]) -> Result<BatchReport> {
        self.run_with_reporter(stage, tasks, &NullProgressReporter)
    }

    /// Run a batch to completion.
    ///
    /// Tasks whose output is already complete are reported as skipped and not
    /// executed. Failures never stop sibling tasks; the caller inspects the
    /// report. Only a malformed batch (repeated identifiers) is an error.
    pub fn run_with_reporter(
        &self,
        stage: &str,
        tasks: &[Task],
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let mut seen = HashSet::new();
        if let Some(dup) = tasks.iter().find(|t| !seen.insert(t.identifier())) {
            return Err(PdpError::Config(format!(
                "task identifier {:?} repeated in {stage} batch",
                dup.identifier()
            )));
        }

        let start = Instant::now();
        reporter.start(stage, tasks.len());

        let mut slots: Vec<Option<TaskResult>> = vec![None; tasks.len()];
        let mut pending_idx = Vec::new();
        let mut pending = Vec::new();
        for (idx, task) in tasks.iter().enumerate() {
            if self.is_complete(task) {
                tracing::debug!(task = task.identifier(), "output exists, skipping");
                let result = TaskResult::skipped(task);
                reporter.report(&result);
                slots[idx] = Some(result);
            } else {
                pending_idx.push(idx);
                pending.push(task.clone());
            }
        }

        tracing::info!(
            stage,
            backend = self.backend.name(),
            completion = self.checker.name(),
            total = tasks.len(),
            skipped = tasks.len() - pending.len(),
            concurrency = self.config.concurrency,
            "dispatching batch"
        );

        if !pending.is_empty() {
            let executed = self.backend.submit(&pending, &self.config, reporter);
            for (idx, result) in pending_idx.into_iter().zip(executed) {
                slots[idx] = Some(result);
            }
        }
        reporter.complete();

        let results: Vec<TaskResult> = slots
            .into_iter()
            .zip(tasks)
            .map(|(slot, task)| {
                slot.unwrap_or_else(|| {
                    TaskResult::failed(task, "backend returned no result", Duration::ZERO)
                })
            })
            .collect();

        let report = BatchReport {
            stage: stage.to_string(),
            results,
            duration: start.elapsed(),
        };
        for failure in report.failures() {
            tracing::warn!(
                stage,
                task = %failure.identifier,
                detail = failure.error_detail.as_deref().unwrap_or(""),
                "task failed"
            );
        }
        tracing::info!(
            stage,
            failed = report.count(TaskStatus::Failed),
            elapsed = ?report.duration,
            "batch complete"
        );
        Ok(report)
    }

    /// Whether the task's output satisfies the completion policy, with
    /// relative outputs resolved against the working directory.
    #[must_use]
    pub fn is_complete(&self, task: &Task) -> bool {
        if task.expected_output().is_absolute() {
            self.checker.is_complete(task)
        } else {
            let resolved = Task::new(
                task.identifier(),
                task.command(),
                self.resolve(task.expected_output()),
            );
            self.checker.is_complete(&resolved)
        }
    }
}
