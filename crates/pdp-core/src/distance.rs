//! Pairwise distance summaries of amplicon alignments.

use std::collections::HashSet;
use std::path::Path;

use rayon::prelude::*;

use crate::error::{PdpError, Result};
use crate::fasta::read_records;

/// Error type for alignment construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DistanceError {
    /// The alignment has no sequences.
    #[error("alignment contains no sequences")]
    Empty,

    /// A sequence's length differs from the first sequence's.
    #[error("sequence {id:?} has length {found}, expected {expected}")]
    UnequalLengths {
        id: String,
        expected: usize,
        found: usize,
    },
}

/// Aligned sequences of identical length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    ids: Vec<String>,
    rows: Vec<Vec<u8>>,
}

impl Alignment {
    /// Build an alignment, checking that it is non-empty and rectangular.
    pub fn new(sequences: Vec<(String, Vec<u8>)>) -> std::result::Result<Self, DistanceError> {
        let Some(width) = sequences.first().map(|(_, s)| s.len()) else {
            return Err(DistanceError::Empty);
        };
        if let Some((id, seq)) = sequences.iter().find(|(_, s)| s.len() != width) {
            return Err(DistanceError::UnequalLengths {
                id: id.clone(),
                expected: width,
                found: seq.len(),
            });
        }
        let (ids, rows) = sequences
            .into_iter()
            .map(|(id, seq)| (id, seq.to_ascii_uppercase()))
            .unzip();
        Ok(Self { ids, rows })
    }

    /// Read an aligned FASTA file.
    pub fn from_fasta(path: &Path) -> Result<Self> {
        let sequences = read_records(path)?
            .into_iter()
            .map(|r| (r.id().to_string(), r.seq().to_vec()))
            .collect();
        Self::new(sequences).map_err(|e| PdpError::Alignment {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Distance statistics for one primer's amplicons.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceSummaryRow {
    pub primer_name: String,
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub max: f64,
    /// Number of distinct sequences.
    pub unique_count: usize,
    /// Sequences beyond the first copy of each distinct one.
    pub nonunique_count: usize,
}

fn is_gap(b: u8) -> bool {
    b == b'-' || b == b'.'
}

/// Mismatch rate between two aligned rows, ignoring columns that are gaps in
/// both. Rows sharing no comparable column are at distance zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pairwise_distance(a: &[u8], b: &[u8]) -> f64 {
    let (compared, mismatched) = a
        .iter()
        .zip(b)
        .filter(|(x, y)| !(is_gap(**x) && is_gap(**y)))
        .fold((0usize, 0usize), |(n, m), (x, y)| {
            (n + 1, m + usize::from(x != y))
        });
    if compared == 0 {
        0.0
    } else {
        mismatched as f64 / compared as f64
    }
}

/// Summarise the pairwise distance distribution of an alignment.
///
/// A single-sequence alignment has no pairs; its statistics are all zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_distance(primer_name: &str, alignment: &Alignment) -> DistanceSummaryRow {
    let rows = &alignment.rows;
    let n = rows.len();

    let distances: Vec<f64> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| (i + 1..n).map(move |j| pairwise_distance(&rows[i], &rows[j])))
        .collect();

    let unique_count = rows.iter().collect::<HashSet<_>>().len();
    let (mean, sd, min, max) = if distances.is_empty() {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        let count = distances.len() as f64;
        let mean = distances.iter().sum::<f64>() / count;
        let var = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / count;
        let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let max = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (mean, var.sqrt(), min, max)
    };

    DistanceSummaryRow {
        primer_name: primer_name.to_string(),
        mean,
        sd,
        min,
        max,
        unique_count,
        nonunique_count: n - unique_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(seqs: &[&str]) -> Alignment {
        Alignment::new(
            seqs.iter()
                .enumerate()
                .map(|(i, s)| (format!("s{i}"), s.as_bytes().to_vec()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn single_sequence_is_neutral() {
        let row = compute_distance("p1", &aln(&["ACGT"]));
        assert_eq!(row.mean, 0.0);
        assert_eq!(row.sd, 0.0);
        assert_eq!(row.min, 0.0);
        assert_eq!(row.max, 0.0);
        assert_eq!(row.unique_count, 1);
        assert_eq!(row.nonunique_count, 0);
    }

    #[test]
    fn identical_pair() {
        let row = compute_distance("p", &aln(&["ACGT", "acgt"]));
        assert_eq!(row.mean, 0.0);
        assert_eq!(row.unique_count, 1);
        assert_eq!(row.nonunique_count, 1);
    }

    #[test]
    fn three_sequences_statistics() {
        // d(0,1)=0.25, d(0,2)=0.5, d(1,2)=0.25
        let row = compute_distance("p", &aln(&["AAAA", "AAAT", "AATT"]));
        assert!((row.mean - 1.0 / 3.0).abs() < 1e-12);
        assert!((row.min - 0.25).abs() < 1e-12);
        assert!((row.max - 0.5).abs() < 1e-12);
        let expected_sd = ((2.0 * (0.25f64 - 1.0 / 3.0).powi(2)
            + (0.5f64 - 1.0 / 3.0).powi(2))
            / 3.0)
            .sqrt();
        assert!((row.sd - expected_sd).abs() < 1e-12);
        assert_eq!(row.unique_count, 3);
        assert_eq!(row.nonunique_count, 0);
    }

    #[test]
    fn shared_gap_columns_ignored() {
        assert!((pairwise_distance(b"A--T", b"A--G") - 0.5).abs() < 1e-12);
        assert!((pairwise_distance(b"A-T", b"AGT") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(pairwise_distance(b"---", b"---"), 0.0);
    }

    #[test]
    fn unequal_lengths_rejected() {
        let err = Alignment::new(vec![
            ("a".into(), b"ACGT".to_vec()),
            ("b".into(), b"ACG".to_vec()),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DistanceError::UnequalLengths {
                id: "b".into(),
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn empty_alignment_rejected() {
        assert_eq!(Alignment::new(vec![]).unwrap_err(), DistanceError::Empty);
    }

    #[test]
    fn from_fasta_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.aln");
        std::fs::write(&path, ">a\nACGT\n>b\nAC\n").unwrap();
        let err = Alignment::from_fasta(&path).unwrap_err();
        assert!(matches!(err, PdpError::Alignment { .. }));
        assert!(err.to_string().contains("p.aln"));

        std::fs::write(&path, ">a\nAC-T\n>b\nACGT\n").unwrap();
        let ok = Alignment::from_fasta(&path).unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.ids(), ["a", "b"]);
    }
}
