//! Amplicon location and per-primer amplicon files.
//!
//! [`AmpliconLocator`] is the boundary to whatever predicts amplicon
//! coordinates. [`PrimerSearchLocator`] reads PrimerSearch reports recorded in
//! a genome collection and slices the amplified regions out of the target
//! genomes. It is immutable once built, so one instance is shared by every
//! extraction worker.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bio::io::fasta;

use crate::collection::GenomeCollection;
use crate::error::{PdpError, Result};
use crate::fasta::{read_sequence_map, write_records};
use crate::primers::Primer;
use crate::primersearch::{self, Amplimer};

/// One amplified sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amplicon {
    pub id: String,
    pub description: String,
    pub sequence: Vec<u8>,
}

impl Amplicon {
    #[must_use]
    pub fn to_record(&self) -> fasta::Record {
        let desc = (!self.description.is_empty()).then_some(self.description.as_str());
        fasta::Record::with_attrs(&self.id, desc, &self.sequence)
    }
}

/// Write one primer's amplicons as FASTA.
pub fn write_amplicons(path: &Path, amplicons: &[Amplicon]) -> Result<()> {
    let records: Vec<fasta::Record> = amplicons.iter().map(Amplicon::to_record).collect();
    write_records(path, &records)
}

/// Finds the amplicons a primer produces across a genome collection.
pub trait AmpliconLocator: Send + Sync {
    fn locate(&self, primer: &Primer) -> Result<Vec<Amplicon>>;
}

#[derive(Debug, Clone)]
struct Hit {
    target: String,
    report: PathBuf,
    amplimer: Amplimer,
}

/// Locator backed by PrimerSearch reports.
#[derive(Debug)]
pub struct PrimerSearchLocator {
    hits: HashMap<String, Vec<Hit>>,
    sequences: HashMap<String, HashMap<String, Vec<u8>>>,
}

impl PrimerSearchLocator {
    /// Parse every report referenced by the collection and load the target
    /// sequences those reports point into.
    pub fn from_collection(coll: &GenomeCollection) -> Result<Self> {
        let mut hits: HashMap<String, Vec<Hit>> = HashMap::new();

        for genome in coll.genomes() {
            let Some(map_path) = genome.primersearch.as_deref() else {
                continue;
            };
            for (target, report) in read_report_map(map_path)? {
                if coll.get(&target).is_none() {
                    return Err(PdpError::Config(format!(
                        "{} refers to genome {target:?}, which is not in the collection",
                        map_path.display()
                    )));
                }
                for result in primersearch::parse_file(&report)? {
                    let entry = hits.entry(result.primer_name).or_default();
                    entry.extend(result.amplimers.into_iter().map(|amplimer| Hit {
                        target: target.clone(),
                        report: report.clone(),
                        amplimer,
                    }));
                }
            }
        }

        let index = coll.index();
        let mut sequences = HashMap::new();
        for hit in hits.values().flatten() {
            if sequences.contains_key(&hit.target) {
                continue;
            }
            // Checked above: every target is in the collection.
            if let Some(genome) = index.get(hit.target.as_str()) {
                let seqs = read_sequence_map(genome.search_seqfile())?;
                sequences.insert(hit.target.clone(), seqs);
            }
        }

        tracing::info!(
            primers = hits.len(),
            genomes = sequences.len(),
            "indexed PrimerSearch amplimers"
        );
        Ok(Self { hits, sequences })
    }

    /// Number of primers with at least one reported amplimer entry.
    #[must_use]
    pub fn primer_count(&self) -> usize {
        self.hits.len()
    }
}

impl AmpliconLocator for PrimerSearchLocator {
    fn locate(&self, primer: &Primer) -> Result<Vec<Amplicon>> {
        let Some(hits) = self.hits.get(&primer.name) else {
            return Ok(Vec::new());
        };
        hits.iter()
            .enumerate()
            .map(|(i, hit)| {
                let seq = self
                    .sequences
                    .get(&hit.target)
                    .and_then(|m| m.get(&hit.amplimer.sequence_id))
                    .ok_or_else(|| {
                        PdpError::parse(
                            &hit.report,
                            format!(
                                "sequence {:?} not found in genome {}",
                                hit.amplimer.sequence_id, hit.target
                            ),
                        )
                    })?;
                let span = hit.amplimer.span();
                let region = seq.get(span.clone()).ok_or_else(|| {
                    PdpError::parse(
                        &hit.report,
                        format!(
                            "amplimer {}..{} lies outside {} ({} bp)",
                            span.start + 1,
                            span.end,
                            hit.amplimer.sequence_id,
                            seq.len()
                        ),
                    )
                })?;
                Ok(Amplicon {
                    id: format!("{}_{}_{}", hit.target, hit.amplimer.sequence_id, i + 1),
                    description: format!(
                        "{} {}..{} mismatches={}/{}",
                        primer.name,
                        span.start + 1,
                        span.end,
                        hit.amplimer.forward_mismatches,
                        hit.amplimer.reverse_mismatches
                    ),
                    sequence: region.to_vec(),
                })
            })
            .collect()
    }
}

/// Read a genome's `target → report` map. Sorted by target name.
pub fn read_report_map(path: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let file = File::open(path).map_err(|e| PdpError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| PdpError::parse(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::GenomeData;

    fn primer(name: &str) -> Primer {
        Primer {
            name: name.into(),
            forward_seq: "ACGT".into(),
            reverse_seq: "TTTT".into(),
            internal_seq: None,
            forward_start: None,
            reverse_start: None,
            size: None,
            extra: serde_json::Map::new(),
        }
    }

    fn fixture(dir: &Path) -> GenomeCollection {
        std::fs::write(dir.join("g1.fna"), ">chr\nAAAACCCCGGGGTTTT\n").unwrap();
        std::fs::write(dir.join("g2.fna"), ">c2\nTTTTGGGGCCCCAAAA\n").unwrap();
        std::fs::write(
            dir.join("g1_vs_g1.ps"),
            "Primer name p1\nAmplimer 1\n\tSequence: chr\n\t\n\
             \tAAAA hits forward strand at 3 with 0 mismatches\n\
             \tGGGG hits reverse strand at [5] with 0 mismatches\n\
             \tAmplimer length: 6 bp\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("g1_vs_g2.ps"),
            "Primer name p1\nAmplimer 1\n\tSequence: c2\n\tsecond\n\
             \tAAAA hits forward strand at 1 with 1 mismatches\n\
             \tGGGG hits reverse strand at [9] with 0 mismatches\n\
             \tAmplimer length: 8 bp\n\nPrimer name p2\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("g1_ps.json"),
            format!(
                r#"{{"g2": "{}", "g1": "{}"}}"#,
                dir.join("g1_vs_g2.ps").display(),
                dir.join("g1_vs_g1.ps").display()
            ),
        )
        .unwrap();
        GenomeCollection::new(
            "t",
            vec![
                GenomeData {
                    name: "g1".into(),
                    groups: vec![],
                    seqfile: dir.join("g1.fna"),
                    filtered_seqfile: None,
                    features: None,
                    primers: None,
                    primersearch: Some(dir.join("g1_ps.json")),
                },
                GenomeData {
                    name: "g2".into(),
                    groups: vec![],
                    seqfile: dir.join("g2.fna"),
                    filtered_seqfile: None,
                    features: None,
                    primers: None,
                    primersearch: None,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn locates_amplicons_in_target_order() {
        let dir = tempfile::tempdir().unwrap();
        let coll = fixture(dir.path());
        let locator = PrimerSearchLocator::from_collection(&coll).unwrap();
        assert_eq!(locator.primer_count(), 2);

        let amps = locator.locate(&primer("p1")).unwrap();
        assert_eq!(amps.len(), 2);
        assert_eq!(amps[0].id, "g1_chr_1");
        assert_eq!(amps[0].sequence, b"AACCCC".to_vec());
        assert_eq!(amps[1].id, "g2_c2_2");
        assert_eq!(amps[1].sequence, b"TTTTGGGG".to_vec());
        assert!(amps[1].description.contains("mismatches=1/0"));
    }

    #[test]
    fn primer_without_hits_has_no_amplicons() {
        let dir = tempfile::tempdir().unwrap();
        let locator = PrimerSearchLocator::from_collection(&fixture(dir.path())).unwrap();
        assert!(locator.locate(&primer("p2")).unwrap().is_empty());
        assert!(locator.locate(&primer("unknown")).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_amplimer_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let coll = fixture(dir.path());
        std::fs::write(
            dir.path().join("g1_vs_g1.ps"),
            "Primer name p9\nAmplimer 1\n\tSequence: chr\n\t\n\
             \tAAAA hits forward strand at 10 with 0 mismatches\n\
             \tAmplimer length: 50 bp\n",
        )
        .unwrap();
        let locator = PrimerSearchLocator::from_collection(&coll).unwrap();
        let err = locator.locate(&primer("p9")).unwrap_err();
        assert!(err.to_string().contains("outside chr"));
    }

    #[test]
    fn unknown_target_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let coll = fixture(dir.path());
        std::fs::write(dir.path().join("g1_ps.json"), r#"{"g7": "nowhere.ps"}"#).unwrap();
        let err = PrimerSearchLocator::from_collection(&coll).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn amplicon_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p1.fasta");
        let amps = vec![Amplicon {
            id: "g1_chr_1".into(),
            description: "p1 3..8".into(),
            sequence: b"AACCCC".to_vec(),
        }];
        write_amplicons(&path, &amps).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(">g1_chr_1 p1 3..8\nAACCCC"));
    }
}
