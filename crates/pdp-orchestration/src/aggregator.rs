//! Order-independent aggregation of task results and worker outputs.
//!
//! Arrival order depends on scheduling and must never reach a report, so
//! every mapping built here is a `BTreeMap` and every list is sorted by
//! identifier.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use pdp_core::error::{PdpError, Result};
use pdp_core::task::TaskResult;

/// Successful outputs and failures of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    /// Identifier → output path, for succeeded and skipped tasks.
    pub outputs: BTreeMap<String, PathBuf>,
    /// Failed results, sorted by identifier.
    pub failures: Vec<TaskResult>,
}

impl Aggregate {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Split results into an ordered output map and a sorted failure list.
pub fn aggregate<I>(results: I) -> Aggregate
where
    I: IntoIterator<Item = TaskResult>,
{
    let mut agg = Aggregate::default();
    for result in results {
        if result.is_success() {
            agg.outputs
                .insert(result.identifier.clone(), result.output_path.clone());
        } else {
            agg.failures.push(result);
        }
    }
    agg.failures.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    agg
}

/// Union disjoint per-worker mappings into one ordered mapping.
///
/// Workers cover disjoint key sets; a repeated key means two workers claimed
/// the same primer and is reported as an error rather than resolved.
pub fn merge_partial_maps<V, I>(parts: I) -> Result<BTreeMap<String, V>>
where
    I: IntoIterator<Item = HashMap<String, V>>,
{
    let mut merged = BTreeMap::new();
    for (key, value) in parts.into_iter().flatten() {
        if merged.contains_key(&key) {
            return Err(PdpError::DuplicateKey(key));
        }
        merged.insert(key, value);
    }
    Ok(merged)
}
