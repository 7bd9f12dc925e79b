//! Amplicon extraction, alignment and distance summary for a primer set.
//!
//! Extraction fans out one worker per primer; each worker returns its own
//! `primer → FASTA` mapping and the mappings are merged afterwards. Alignment
//! commands then go through the [`Dispatcher`], and distances are computed
//! only from alignments present on disk once that batch has finished.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use pdp_core::amplicon::{write_amplicons, Amplicon, AmpliconLocator};
use pdp_core::constants::{ALIGNMENT_EXTENSION, DISTANCES_SUMMARY, FASTA_EXTENSION};
use pdp_core::distance::{compute_distance, Alignment, DistanceSummaryRow};
use pdp_core::error::{PdpError, Result};
use pdp_core::primers::{Primer, PrimerSet};
use pdp_core::task::{Task, TaskResult};

use crate::aggregator::{aggregate, merge_partial_maps};
use crate::backend::{quote, quote_path, worker_pool};
use crate::dispatcher::Dispatcher;
use crate::interfaces::ProgressReporter;
use crate::report::write_distance_summary;

/// Options for an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Directory receiving FASTA, alignment and summary files.
    pub outdir: PathBuf,
    /// Aligner executable; `None` disables alignment.
    pub aligner: Option<String>,
}

/// Everything an extraction run produced.
#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    pub amplicon_fasta: BTreeMap<String, PathBuf>,
    pub alignments: BTreeMap<String, PathBuf>,
    /// Summary rows, sorted by primer name.
    pub rows: Vec<DistanceSummaryRow>,
    pub summary_path: PathBuf,
    /// Failed extraction and alignment tasks, sorted by identifier.
    pub failures: Vec<TaskResult>,
    /// Data-integrity warnings for primers left out of the summary.
    pub warnings: Vec<String>,
}

impl ExtractOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run extraction, optional alignment and distance summary for `primers`.
pub fn run_extraction(
    primers: &PrimerSet,
    locator: &dyn AmpliconLocator,
    dispatcher: &Dispatcher,
    opts: &ExtractOptions,
    reporter: &dyn ProgressReporter,
) -> Result<ExtractOutcome> {
    let pool = worker_pool(dispatcher.config().concurrency).map_err(|e| PdpError::Tool {
        program: "worker pool".into(),
        message: e.to_string(),
    })?;
    let outdir = dispatcher.resolve(&opts.outdir);

    tracing::info!(primers = primers.len(), "extracting amplicons from source genomes");
    reporter.start("extract", primers.len());
    let extracted: Vec<(TaskResult, Option<PathBuf>)> = pool.install(|| {
        primers
            .primers()
            .par_iter()
            .map(|p| {
                let outcome = extract_one(p, locator, dispatcher, &outdir);
                reporter.report(&outcome.0);
                outcome
            })
            .collect()
    });
    reporter.complete();

    let mut partials = Vec::new();
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    for (result, fasta) in extracted {
        match fasta {
            _ if !result.is_success() => failures.push(result),
            Some(path) => partials.push(HashMap::from([(result.identifier, path)])),
            None => {
                tracing::warn!(primer = %result.identifier, "no amplicons found");
                warnings.push(format!("{}: no amplicons found", result.identifier));
            }
        }
    }
    let amplicon_fasta = merge_partial_maps(partials)?;

    let alignments = match &opts.aligner {
        Some(aligner) => {
            tracing::info!(aligner = %aligner, "aligning amplicons");
            let tasks = alignment_tasks(&amplicon_fasta, aligner, &outdir);
            let report = dispatcher.run_with_reporter("align", &tasks, reporter)?;
            failures.extend(aggregate(report.results).failures);
            tasks
                .into_iter()
                .map(|t| (t.identifier().to_string(), t.expected_output().to_path_buf()))
                .collect()
        }
        None => amplicon_fasta.clone(),
    };
    failures.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    tracing::info!("calculating distance matrices");
    let computed: Vec<std::result::Result<DistanceSummaryRow, String>> = pool.install(|| {
        alignments
            .par_iter()
            .map(|(name, path)| summarise(name, path))
            .collect()
    });
    let mut rows = Vec::with_capacity(computed.len());
    for item in computed {
        match item {
            Ok(row) => rows.push(row),
            Err(warning) => {
                tracing::warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    let summary_path = outdir.join(DISTANCES_SUMMARY);
    write_distance_summary(&summary_path, &rows)?;

    Ok(ExtractOutcome {
        amplicon_fasta,
        alignments,
        rows,
        summary_path,
        failures,
        warnings,
    })
}

/// Locate and write one primer's amplicons unless its FASTA is already
/// complete under the dispatcher's completion policy.
///
/// Returns the primer's result and the FASTA path when one exists afterwards.
fn extract_one(
    primer: &Primer,
    locator: &dyn AmpliconLocator,
    dispatcher: &Dispatcher,
    outdir: &Path,
) -> (TaskResult, Option<PathBuf>) {
    let path = outdir.join(format!("{}.{FASTA_EXTENSION}", primer.name));
    let task = Task::new(primer.name.as_str(), "locate amplicons", &path);
    if dispatcher.is_complete(&task) {
        tracing::debug!(primer = %primer.name, "amplicon file complete, skipping");
        return (TaskResult::skipped(&task), Some(path));
    }

    let start = Instant::now();
    let written = locator.locate(primer).and_then(|amplicons| {
        if amplicons.is_empty() {
            Ok(false)
        } else {
            commit_amplicons(&path, &amplicons).map(|()| true)
        }
    });
    match written {
        Ok(true) => (TaskResult::succeeded(&task, start.elapsed()), Some(path)),
        Ok(false) => (TaskResult::succeeded(&task, start.elapsed()), None),
        Err(e) => {
            tracing::error!(primer = %primer.name, error = %e, "amplicon extraction failed");
            (TaskResult::failed(&task, e.to_string(), start.elapsed()), None)
        }
    }
}

/// Write `<primer>.fasta.partial`, then rename it over the final name.
fn commit_amplicons(path: &Path, amplicons: &[Amplicon]) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);
    write_amplicons(&partial, amplicons)?;
    fs::rename(&partial, path).map_err(|e| PdpError::io(path, e))
}

/// One aligner task per primer, writing `<primer>.aln` via a temporary file
/// so a failed run never leaves an output that looks complete.
#[must_use]
pub fn alignment_tasks(
    fasta: &BTreeMap<String, PathBuf>,
    aligner: &str,
    outdir: &Path,
) -> Vec<Task> {
    fasta
        .iter()
        .map(|(name, input)| {
            let output = outdir.join(format!("{name}.{ALIGNMENT_EXTENSION}"));
            let partial = outdir.join(format!("{name}.{ALIGNMENT_EXTENSION}.partial"));
            let command = format!(
                "{} --quiet {} > {} && mv {} {}",
                quote(aligner),
                quote_path(input),
                quote_path(&partial),
                quote_path(&partial),
                quote_path(&output)
            );
            Task::new(name.clone(), command, output)
        })
        .collect()
}

/// Distance row for one alignment, or a warning explaining its absence.
fn summarise(name: &str, path: &Path) -> std::result::Result<DistanceSummaryRow, String> {
    if !path.exists() {
        return Err(format!(
            "{name}: expected alignment {} is missing",
            path.display()
        ));
    }
    match Alignment::from_fasta(path) {
        Ok(alignment) => Ok(compute_distance(name, &alignment)),
        Err(e) => Err(format!("{name}: {e}")),
    }
}
