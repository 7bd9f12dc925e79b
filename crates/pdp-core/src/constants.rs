//! Constants for output naming, report layout and process exit status.

/// File name of the per-primer distance summary table.
pub const DISTANCES_SUMMARY: &str = "distances_summary.tab";

/// Column headers of the distance summary table, in output order.
pub const SUMMARY_HEADER: [&str; 7] = [
    "primer",
    "dist_mean",
    "dist_sd",
    "dist_min",
    "dist_max",
    "unique",
    "nonunique",
];

/// Extension of per-primer amplicon sequence files.
pub const FASTA_EXTENSION: &str = "fasta";

/// Extension of per-primer alignment files.
pub const ALIGNMENT_EXTENSION: &str = "aln";

/// Default aligner executable.
pub const DEFAULT_MAFFT: &str = "mafft";

/// Default gene-caller executable.
pub const DEFAULT_PRODIGAL: &str = "prodigal";

/// Default PrimerSearch executable.
pub const DEFAULT_PRIMERSEARCH: &str = "primersearch";

/// Default PrimerSearch mismatch allowance, in percent.
pub const DEFAULT_MISMATCH_PERCENT: u32 = 10;

/// Number of trailing diagnostic lines kept from a failed task's output.
pub const ERROR_TAIL_LINES: usize = 20;

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error (I/O, unexpected tool behaviour).
    pub const ERROR_GENERIC: i32 = 1;
    /// One or more tasks in a stage failed.
    pub const ERROR_STAGE: i32 = 2;
    /// Invalid configuration or input descriptor.
    pub const ERROR_CONFIG: i32 = 4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_header_layout() {
        assert_eq!(SUMMARY_HEADER.len(), 7);
        assert_eq!(SUMMARY_HEADER[0], "primer");
        assert_eq!(SUMMARY_HEADER[6], "nonunique");
    }

    #[test]
    fn exit_codes_distinct() {
        let codes = [
            exit_codes::SUCCESS,
            exit_codes::ERROR_GENERIC,
            exit_codes::ERROR_STAGE,
            exit_codes::ERROR_CONFIG,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
