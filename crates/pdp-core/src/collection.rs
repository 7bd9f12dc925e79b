//! Genome collection descriptors.
//!
//! A collection is a JSON array of genome records. Each record names a genome,
//! the classes it belongs to, and the files produced for it by earlier stages.
//! Stages that produce new per-genome files update the record and write the
//! collection back out.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PdpError, Result};

/// Files and class labels for one genome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeData {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Nucleotide sequence (FASTA).
    pub seqfile: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_seqfile: Option<PathBuf>,
    /// Gene-caller output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<PathBuf>,
    /// JSON primer file designed on this genome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primers: Option<PathBuf>,
    /// JSON map of target genome name to PrimerSearch report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primersearch: Option<PathBuf>,
}

impl GenomeData {
    /// File stem of the sequence file, used to name derived outputs.
    #[must_use]
    pub fn stem(&self) -> String {
        self.seqfile
            .file_stem()
            .map_or_else(|| self.name.clone(), |s| s.to_string_lossy().into_owned())
    }

    /// Sequence file searched for primer binding sites.
    #[must_use]
    pub fn search_seqfile(&self) -> &Path {
        self.filtered_seqfile.as_deref().unwrap_or(&self.seqfile)
    }
}

/// Ordered set of genomes with unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeCollection {
    name: String,
    genomes: Vec<GenomeData>,
}

impl GenomeCollection {
    /// Build a collection, rejecting empty or repeated genome names.
    pub fn new(name: impl Into<String>, genomes: Vec<GenomeData>) -> Result<Self> {
        let mut seen = HashSet::new();
        for g in &genomes {
            if g.name.trim().is_empty() {
                return Err(PdpError::Config("genome record with empty name".into()));
            }
            if !seen.insert(g.name.as_str()) {
                return Err(PdpError::Config(format!(
                    "genome {:?} is listed more than once",
                    g.name
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            genomes,
        })
    }

    /// Load a JSON descriptor. The collection is named after the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PdpError::io(path, e))?;
        let genomes: Vec<GenomeData> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| PdpError::parse(path, e.to_string()))?;
        let name = path
            .file_stem()
            .map_or_else(|| "collection".to_string(), |s| s.to_string_lossy().into_owned());
        tracing::debug!(path = %path.display(), genomes = genomes.len(), "loaded genome collection");
        Self::new(name, genomes)
    }

    /// Check that every declared sequence file exists.
    pub fn validate_files(&self) -> Result<()> {
        let missing: Vec<String> = self
            .genomes
            .iter()
            .filter(|g| !g.seqfile.is_file())
            .map(|g| format!("{} ({})", g.name, g.seqfile.display()))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PdpError::Config(format!(
                "sequence files not found: {}",
                missing.join(", ")
            )))
        }
    }

    /// Write the collection as a JSON descriptor.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| PdpError::io(path, e))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, &self.genomes)
            .map_err(|e| PdpError::io(path, std::io::Error::other(e)))?;
        writeln!(out).map_err(|e| PdpError::io(path, e))?;
        out.flush().map_err(|e| PdpError::io(path, e))
    }

    /// Sorted, de-duplicated class labels across all genomes.
    #[must_use]
    pub fn groups(&self) -> Vec<String> {
        self.genomes
            .iter()
            .flat_map(|g| g.groups.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Look up a genome by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GenomeData> {
        self.genomes.iter().find(|g| g.name == name)
    }

    /// Name → genome index for repeated lookups.
    #[must_use]
    pub fn index(&self) -> HashMap<&str, &GenomeData> {
        self.genomes.iter().map(|g| (g.name.as_str(), g)).collect()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn genomes(&self) -> &[GenomeData] {
        &self.genomes
    }

    /// Mutable access for stages that record new per-genome outputs.
    pub fn genomes_mut(&mut self) -> &mut [GenomeData] {
        &mut self.genomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genome(name: &str, groups: &[&str], seqfile: &str) -> GenomeData {
        GenomeData {
            name: name.into(),
            groups: groups.iter().map(ToString::to_string).collect(),
            seqfile: seqfile.into(),
            filtered_seqfile: None,
            features: None,
            primers: None,
            primersearch: None,
        }
    }

    #[test]
    fn groups_sorted_and_unique() {
        let coll = GenomeCollection::new(
            "test",
            vec![
                genome("gv2", &["gv2", "Pectobacterium"], "a.fna"),
                genome("atro", &["atrosepticum_NCBI", "Pectobacterium"], "b.fna"),
                genome("gv1", &["gv1", "Pectobacterium"], "c.fna"),
            ],
        )
        .unwrap();
        assert_eq!(
            coll.groups(),
            ["Pectobacterium", "atrosepticum_NCBI", "gv1", "gv2"]
        );
    }

    #[test]
    fn duplicate_genome_rejected() {
        let err = GenomeCollection::new(
            "test",
            vec![genome("a", &[], "a.fna"), genome("a", &[], "b.fna")],
        )
        .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn load_save_roundtrip_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pectos.json");
        std::fs::write(
            &path,
            r#"[{"name": "gv1", "groups": ["gv1"], "seqfile": "gv1.fna",
                 "primers": "gv1_primers.json"},
                {"name": "gv2", "seqfile": "gv2.fna"}]"#,
        )
        .unwrap();
        let coll = GenomeCollection::load(&path).unwrap();
        assert_eq!(coll.name(), "pectos");
        assert_eq!(coll.len(), 2);
        assert_eq!(
            coll.get("gv1").unwrap().primers.as_deref(),
            Some(Path::new("gv1_primers.json"))
        );
        assert!(coll.get("gv2").unwrap().groups.is_empty());

        let out = dir.path().join("out.json");
        coll.save(&out).unwrap();
        assert_eq!(GenomeCollection::load(&out).unwrap().genomes(), coll.genomes());
    }

    #[test]
    fn missing_seqfile_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.fna");
        std::fs::write(&present, ">a\nA\n").unwrap();
        let coll = GenomeCollection::new(
            "t",
            vec![
                genome("ok", &[], present.to_str().unwrap()),
                genome("gone", &[], "/nonexistent/gone.fna"),
            ],
        )
        .unwrap();
        let err = coll.validate_files().unwrap_err();
        assert!(err.to_string().contains("gone"));
        assert!(!err.to_string().contains("ok ("));
    }

    #[test]
    fn stem_from_seqfile() {
        assert_eq!(genome("x", &[], "dir/GCF_0001.fna").stem(), "GCF_0001");
    }
}
