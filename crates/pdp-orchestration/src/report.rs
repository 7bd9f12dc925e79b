//! Tab-separated distance summary report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pdp_core::constants::SUMMARY_HEADER;
use pdp_core::distance::DistanceSummaryRow;
use pdp_core::error::{PdpError, Result};

/// Render the summary table, rows sorted by primer name.
#[must_use]
pub fn format_summary(rows: &[DistanceSummaryRow]) -> String {
    let mut sorted: Vec<&DistanceSummaryRow> = rows.iter().collect();
    sorted.sort_by(|a, b| a.primer_name.cmp(&b.primer_name));

    let mut out = SUMMARY_HEADER.join("\t");
    out.push('\n');
    for row in sorted {
        out.push_str(&format!(
            "{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{}\t{}\n",
            row.primer_name,
            row.mean,
            row.sd,
            row.min,
            row.max,
            row.unique_count,
            row.nonunique_count
        ));
    }
    out
}

/// Write the summary table to `path`.
pub fn write_distance_summary(path: &Path, rows: &[DistanceSummaryRow]) -> Result<()> {
    let file = File::create(path).map_err(|e| PdpError::io(path, e))?;
    let mut out = BufWriter::new(file);
    out.write_all(format_summary(rows).as_bytes())
        .map_err(|e| PdpError::io(path, e))?;
    out.flush().map_err(|e| PdpError::io(path, e))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote distance summary");
    Ok(())
}
