//! # pdp-core
//!
//! Core library for the pdp primer design pipeline: task descriptors and
//! results, completion policies, primer and genome collection files,
//! PrimerSearch report parsing, amplicon location, and alignment distance
//! statistics.

pub mod amplicon;
pub mod collection;
pub mod completion;
pub mod constants;
pub mod distance;
pub mod error;
pub mod fasta;
pub mod primers;
pub mod primersearch;
pub mod task;

// Re-exports
pub use amplicon::{Amplicon, AmpliconLocator, PrimerSearchLocator};
pub use collection::{GenomeCollection, GenomeData};
pub use completion::{checker_for, CompletionChecker, NonEmptyOutput, OutputExists};
pub use constants::{exit_codes, DISTANCES_SUMMARY, SUMMARY_HEADER};
pub use distance::{compute_distance, Alignment, DistanceError, DistanceSummaryRow};
pub use error::{PdpError, Result};
pub use primers::{Primer, PrimerSet};
pub use task::{Task, TaskResult, TaskStatus};
