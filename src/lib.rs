//! Fixtures shared by the workspace integration tests in `tests/`.

use std::path::Path;
use std::time::Duration;

use pdp_core::{DistanceSummaryRow, Task, TaskResult, TaskStatus};

/// A finished result for `id` with the given status and `<id>.out` output.
#[must_use]
pub fn result(id: &str, status: TaskStatus) -> TaskResult {
    let task = Task::new(id, "true", format!("{id}.out"));
    match status {
        TaskStatus::Succeeded => TaskResult::succeeded(&task, Duration::ZERO),
        TaskStatus::Skipped => TaskResult::skipped(&task),
        TaskStatus::Failed => TaskResult::failed(&task, format!("{id} failed"), Duration::ZERO),
    }
}

/// A summary row with every statistic derived from `mean`.
#[must_use]
pub fn row(name: &str, mean: f64, unique: usize) -> DistanceSummaryRow {
    DistanceSummaryRow {
        primer_name: name.to_string(),
        mean,
        sd: mean / 2.0,
        min: 0.0,
        max: mean * 2.0,
        unique_count: unique,
        nonunique_count: unique / 2,
    }
}

/// `n` shell tasks writing `t<i>.out` under `dir`; tasks listed in `failing`
/// exit 1 without writing anything.
#[must_use]
pub fn shell_tasks(dir: &Path, n: usize, failing: &[usize]) -> Vec<Task> {
    (1..=n)
        .map(|i| {
            let output = dir.join(format!("t{i}.out"));
            let command = if failing.contains(&i) {
                format!("echo 'task {i} broke' >&2; exit 1")
            } else {
                format!("echo {i} >> '{}'", output.display())
            };
            Task::new(format!("t{i}"), command, output)
        })
        .collect()
}
