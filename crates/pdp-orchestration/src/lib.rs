//! # pdp-orchestration
//!
//! Parallel dispatch, scheduler backends, result aggregation, and pipeline stages.

pub mod aggregator;
pub mod backend;
pub mod dispatcher;
pub mod extract;
pub mod interfaces;
pub mod report;
pub mod stages;

pub use aggregator::{aggregate, merge_partial_maps, Aggregate};
pub use backend::{LocalBackend, SgeBackend};
pub use dispatcher::{BatchReport, DispatchConfig, Dispatcher};
pub use extract::{run_extraction, ExtractOptions, ExtractOutcome};
pub use interfaces::{ExecutionBackend, NullProgressReporter, ProgressReporter, ResultPresenter};
pub use report::{format_summary, write_distance_summary};
