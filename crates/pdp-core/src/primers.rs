//! Primer sets loaded from JSON primer files.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PdpError, Result};

/// A single primer pair, keyed by its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primer {
    /// Stable name; the join key across extraction, alignment and distance.
    pub name: String,
    #[serde(default)]
    pub forward_seq: String,
    #[serde(default)]
    pub reverse_seq: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_seq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_start: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_start: Option<u64>,
    /// Expected amplicon size in bp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Other design metadata, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Primer {
    /// Orientation-independent key of the oligo pair.
    fn pair_key(&self) -> (String, String) {
        let fwd = self.forward_seq.to_ascii_uppercase();
        let rev = self.reverse_seq.to_ascii_uppercase();
        if fwd <= rev {
            (fwd, rev)
        } else {
            (rev, fwd)
        }
    }
}

/// A named collection of primers.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimerSet {
    name: String,
    primers: Vec<Primer>,
}

impl PrimerSet {
    /// Build a set, rejecting empty or repeated primer names.
    pub fn new(name: impl Into<String>, primers: Vec<Primer>) -> Result<Self> {
        let mut seen = HashSet::new();
        for p in &primers {
            if p.name.trim().is_empty() {
                return Err(PdpError::Config("primer with empty name".into()));
            }
            if !seen.insert(p.name.as_str()) {
                return Err(PdpError::Config(format!(
                    "primer name {:?} appears more than once",
                    p.name
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            primers,
        })
    }

    /// Load a JSON primer file. The set is named after the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PdpError::io(path, e))?;
        let primers: Vec<Primer> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| PdpError::parse(path, e.to_string()))?;
        let name = path
            .file_stem()
            .map_or_else(|| "primers".to_string(), |s| s.to_string_lossy().into_owned());
        tracing::debug!(path = %path.display(), count = primers.len(), "loaded primers");
        Self::new(name, primers)
    }

    /// Write the set as a JSON primer file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| PdpError::io(path, e))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, &self.primers)
            .map_err(|e| PdpError::io(path, std::io::Error::other(e)))?;
        out.flush().map_err(|e| PdpError::io(path, e))
    }

    /// Write the `name<TAB>forward<TAB>reverse` table PrimerSearch reads.
    pub fn write_primersearch_table(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| PdpError::io(path, e))?;
        let mut out = BufWriter::new(file);
        for p in &self.primers {
            writeln!(out, "{}\t{}\t{}", p.name, p.forward_seq, p.reverse_seq)
                .map_err(|e| PdpError::io(path, e))?;
        }
        out.flush().map_err(|e| PdpError::io(path, e))
    }

    /// Drop primers whose oligo pair repeats an earlier one, in either
    /// orientation. Returns the reduced set and the names removed.
    #[must_use]
    pub fn dedupe(&self) -> (Self, Vec<String>) {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(self.primers.len());
        let mut removed = Vec::new();
        for p in &self.primers {
            if seen.insert(p.pair_key()) {
                kept.push(p.clone());
            } else {
                removed.push(p.name.clone());
            }
        }
        (
            Self {
                name: self.name.clone(),
                primers: kept,
            },
            removed,
        )
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn primers(&self) -> &[Primer] {
        &self.primers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.primers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primer(name: &str, fwd: &str, rev: &str) -> Primer {
        Primer {
            name: name.into(),
            forward_seq: fwd.into(),
            reverse_seq: rev.into(),
            internal_seq: None,
            forward_start: None,
            reverse_start: None,
            size: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = PrimerSet::new(
            "s",
            vec![primer("p1", "AC", "GT"), primer("p1", "AA", "TT")],
        )
        .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn rejects_empty_name() {
        assert!(PrimerSet::new("s", vec![primer(" ", "AC", "GT")]).is_err());
    }

    #[test]
    fn load_keeps_metadata_and_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gv1_primers.json");
        std::fs::write(
            &path,
            r#"[{"name": "gv1_p1", "forward_seq": "ACGT", "reverse_seq": "TTGC",
                "size": 120, "penalty": 0.5}]"#,
        )
        .unwrap();
        let set = PrimerSet::load(&path).unwrap();
        assert_eq!(set.name(), "gv1_primers");
        assert_eq!(set.len(), 1);
        assert_eq!(set.primers()[0].size, Some(120));
        assert_eq!(set.primers()[0].extra["penalty"], serde_json::json!(0.5));

        let out = dir.path().join("copy.json");
        set.save(&out).unwrap();
        let again = PrimerSet::load(&out).unwrap();
        assert_eq!(again.primers(), set.primers());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            PrimerSet::load(&path),
            Err(PdpError::Parse { .. })
        ));
    }

    #[test]
    fn primersearch_table_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.primertab");
        let set = PrimerSet::new("s", vec![primer("p1", "AAC", "GGT")]).unwrap();
        set.write_primersearch_table(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "p1\tAAC\tGGT\n");
    }

    #[test]
    fn dedupe_catches_swapped_orientation() {
        let set = PrimerSet::new(
            "s",
            vec![
                primer("p1", "AAAA", "CCCC"),
                primer("p2", "cccc", "aaaa"),
                primer("p3", "GGGG", "TTTT"),
                primer("p4", "AAAA", "CCCC"),
            ],
        )
        .unwrap();
        let (kept, removed) = set.dedupe();
        let names: Vec<_> = kept.primers().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["p1", "p3"]);
        assert_eq!(removed, ["p2", "p4"]);
    }
}
