//! # pdp-cli
//!
//! CLI output, batch progress display, and shell completion.

pub mod completion;
pub mod output;
pub mod presenter;
pub mod progress;
pub mod ui;

pub use presenter::CliResultPresenter;
pub use progress::BatchProgressReporter;
