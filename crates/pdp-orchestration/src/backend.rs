//! Execution backends: a local worker pool and a blocking SGE submitter.
//!
//! Both backends fan tasks out over a rayon pool of `concurrency` threads and
//! fan results back in over a crossbeam channel tagged with the submission
//! index. The calling thread drains the channel, so progress is reported as
//! tasks finish while the returned vector is still in submission order.

use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Instant;

use crossbeam_channel::Sender;

use pdp_core::constants::ERROR_TAIL_LINES;
use pdp_core::task::{Task, TaskResult};

use crate::dispatcher::DispatchConfig;
use crate::interfaces::{ExecutionBackend, ProgressReporter};

/// Runs each task as `sh -c <command>` on this machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

impl ExecutionBackend for LocalBackend {
    fn submit(
        &self,
        tasks: &[Task],
        config: &DispatchConfig,
        reporter: &dyn ProgressReporter,
    ) -> Vec<TaskResult> {
        execute_pool(tasks, config.concurrency, reporter, |task| {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(task.command());
            run_command(task, cmd, &config.workdir)
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Submits each task to Sun Grid Engine with a blocking `qsub -sync y`.
///
/// Every submission occupies one pool slot until its job terminates, so
/// `concurrency` bounds the number of jobs in the queue at once.
#[derive(Debug, Clone)]
pub struct SgeBackend {
    program: String,
    args: Vec<String>,
}

impl SgeBackend {
    /// Default `qsub` flags: block, run as binary, keep cwd and environment.
    pub const DEFAULT_ARGS: [&'static str; 6] = ["-sync", "y", "-b", "y", "-cwd", "-V"];

    #[must_use]
    pub fn new() -> Self {
        Self::with_program("qsub", Self::DEFAULT_ARGS.iter().map(ToString::to_string).collect())
    }

    /// Use a different submit program and flags.
    #[must_use]
    pub fn with_program(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command_for(&self, task: &Task) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("-N")
            .arg(job_name(task.identifier()))
            .arg("sh")
            .arg("-c")
            .arg(quote(task.command()));
        cmd
    }
}

impl Default for SgeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionBackend for SgeBackend {
    fn submit(
        &self,
        tasks: &[Task],
        config: &DispatchConfig,
        reporter: &dyn ProgressReporter,
    ) -> Vec<TaskResult> {
        execute_pool(tasks, config.concurrency, reporter, |task| {
            run_command(task, self.command_for(task), &config.workdir)
        })
    }

    fn name(&self) -> &str {
        "sge"
    }
}

/// Run `run` for every task on a pool of `concurrency` threads.
pub(crate) fn execute_pool<F>(
    tasks: &[Task],
    concurrency: usize,
    reporter: &dyn ProgressReporter,
    run: F,
) -> Vec<TaskResult>
where
    F: Fn(&Task) -> TaskResult + Sync,
{
    let pool = match worker_pool(concurrency) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "could not start worker pool");
            let detail = format!("worker pool unavailable: {e}");
            let results: Vec<TaskResult> = tasks
                .iter()
                .map(|t| TaskResult::failed(t, detail.clone(), std::time::Duration::ZERO))
                .collect();
            results.iter().for_each(|r| reporter.report(r));
            return results;
        }
    };

    let (tx, rx) = crossbeam_channel::unbounded::<(usize, TaskResult)>();
    let mut slots: Vec<Option<TaskResult>> = vec![None; tasks.len()];

    std::thread::scope(|outer| {
        let run = &run;
        outer.spawn(move || {
            pool.scope(|s| {
                for (idx, task) in tasks.iter().enumerate() {
                    spawn_task(s, idx, task, tx.clone(), run);
                }
            });
        });

        for (idx, result) in &rx {
            reporter.report(&result);
            slots[idx] = Some(result);
        }
    });

    slots.into_iter().flatten().collect()
}

fn spawn_task<'s, F>(
    scope: &rayon::Scope<'s>,
    idx: usize,
    task: &'s Task,
    tx: Sender<(usize, TaskResult)>,
    run: &'s F,
) where
    F: Fn(&Task) -> TaskResult + Sync,
{
    scope.spawn(move |_| {
        tracing::debug!(task = task.identifier(), command = task.command(), "starting task");
        let result = run(task);
        // The receiver lives until every sender is dropped.
        let _ = tx.send((idx, result));
    });
}

/// Build a rayon pool sized to the concurrency limit.
pub(crate) fn worker_pool(
    concurrency: usize,
) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .thread_name(|i| format!("pdp-worker-{i}"))
        .build()
}

/// Run a prepared command and classify the outcome.
fn run_command(task: &Task, mut cmd: Command, workdir: &Path) -> TaskResult {
    let start = Instant::now();
    let output = cmd
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    match output {
        Err(e) => {
            tracing::error!(task = task.identifier(), error = %e, "could not start task");
            TaskResult::failed(task, format!("could not start: {e}"), start.elapsed())
        }
        Ok(out) if !out.status.success() => {
            let detail = describe_failure(&out);
            tracing::error!(task = task.identifier(), detail = %detail, "task failed");
            TaskResult::failed(task, detail, start.elapsed())
        }
        Ok(_) if !output_present(task, workdir) => {
            let detail = format!(
                "exited 0 but did not create {}",
                task.expected_output().display()
            );
            tracing::error!(task = task.identifier(), detail = %detail, "task failed");
            TaskResult::failed(task, detail, start.elapsed())
        }
        Ok(_) => {
            tracing::debug!(task = task.identifier(), elapsed = ?start.elapsed(), "task finished");
            TaskResult::succeeded(task, start.elapsed())
        }
    }
}

fn output_present(task: &Task, workdir: &Path) -> bool {
    workdir.join(task.expected_output()).exists()
}

/// Exit status plus the tail of stderr, or of stdout when stderr is empty.
fn describe_failure(out: &Output) -> String {
    let status = match out.status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    };
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    let text = if stderr.trim().is_empty() { stdout } else { stderr };
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let tail = &lines[lines.len().saturating_sub(ERROR_TAIL_LINES)..];
    if tail.is_empty() {
        status
    } else {
        format!("{status}: {}", tail.join("\n"))
    }
}

/// Quote a word for `sh` when it contains anything beyond a safe set.
#[must_use]
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:,@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Quote a path for `sh`.
#[must_use]
pub fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// SGE job names must not start with a digit or contain path separators.
fn job_name(identifier: &str) -> String {
    let cleaned: String = identifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("pdp_{cleaned}")
}
