//! FASTA reading and writing on top of `bio::io::fasta`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use bio::io::fasta;

use crate::error::{PdpError, Result};

/// Read every record in a FASTA file.
pub fn read_records(path: &Path) -> Result<Vec<fasta::Record>> {
    let file = File::open(path).map_err(|e| PdpError::io(path, e))?;
    fasta::Reader::new(BufReader::new(file))
        .records()
        .map(|r| r.map_err(|e| PdpError::parse(path, e.to_string())))
        .collect()
}

/// Read a FASTA file into an id → sequence map.
pub fn read_sequence_map(path: &Path) -> Result<HashMap<String, Vec<u8>>> {
    Ok(read_records(path)?
        .into_iter()
        .map(|r| (r.id().to_string(), r.seq().to_vec()))
        .collect())
}

/// Write records to `path`, replacing any existing file.
pub fn write_records(path: &Path, records: &[fasta::Record]) -> Result<()> {
    let file = File::create(path).map_err(|e| PdpError::io(path, e))?;
    let mut writer = fasta::Writer::new(BufWriter::new(file));
    for record in records {
        writer
            .write_record(record)
            .map_err(|e| PdpError::io(path, e))?;
    }
    writer.flush().map_err(|e| PdpError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("amplicons.fasta");
        let recs = vec![
            fasta::Record::with_attrs("b", None, b"ACGT"),
            fasta::Record::with_attrs("a", Some("second"), b"TTGA"),
        ];
        write_records(&path, &recs).unwrap();
        let back = read_records(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].id(), "b");
        assert_eq!(back[1].desc(), Some("second"));
        assert_eq!(back[1].seq(), b"TTGA");
    }

    #[test]
    fn sequence_map_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.fna");
        std::fs::write(&path, ">chr1 main\nACGTACGT\nAAAA\n>plasmid\nGGGG\n").unwrap();
        let map = read_sequence_map(&path).unwrap();
        assert_eq!(map["chr1"], b"ACGTACGTAAAA".to_vec());
        assert_eq!(map["plasmid"], b"GGGG".to_vec());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_records(Path::new("/nonexistent/x.fasta")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/x.fasta"));
    }
}
