//! Parser for EMBOSS PrimerSearch reports.
//!
//! A report lists, per primer, every amplimer found in the searched sequences:
//!
//! ```text
//! Primer name gv1_p1
//! Amplimer 1
//!     Sequence: NC_004547
//!     Pectobacterium atrosepticum SCRI1043
//!     ACGTTGCA hits forward strand at 1201 with 0 mismatches
//!     TTGACCAG hits reverse strand at [3411] with 1 mismatches
//!     Amplimer length: 188 bp
//! ```

use std::fs;
use std::path::Path;

use crate::error::{PdpError, Result};

/// One predicted PCR product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amplimer {
    /// Identifier of the sequence the product lies on.
    pub sequence_id: String,
    /// Free-text description line following the identifier.
    pub description: String,
    /// 1-based start of the forward primer hit.
    pub start: usize,
    /// Product length in bp.
    pub length: usize,
    pub forward_mismatches: u32,
    pub reverse_mismatches: u32,
}

impl Amplimer {
    /// 0-based half-open coordinates of the product.
    ///
    /// Saturates at `usize::MAX`; parsed amplimers never get that far.
    #[must_use]
    pub fn span(&self) -> std::ops::Range<usize> {
        let begin = self.start.saturating_sub(1);
        begin..begin.saturating_add(self.length)
    }

    fn end(&self) -> Option<usize> {
        self.start.saturating_sub(1).checked_add(self.length)
    }
}

/// All amplimers reported for one primer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimerSearchResult {
    pub primer_name: String,
    pub amplimers: Vec<Amplimer>,
}

/// Parse a PrimerSearch report from disk.
pub fn parse_file(path: &Path) -> Result<Vec<PrimerSearchResult>> {
    let text = fs::read_to_string(path).map_err(|e| PdpError::io(path, e))?;
    parse_report(&text).map_err(|message| PdpError::parse(path, message))
}

/// Parse the text of a PrimerSearch report.
pub fn parse_report(text: &str) -> std::result::Result<Vec<PrimerSearchResult>, String> {
    let mut results: Vec<PrimerSearchResult> = Vec::new();
    let mut expect_description = false;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let at = lineno + 1;

        if let Some(name) = line.strip_prefix("Primer name ") {
            results.push(PrimerSearchResult {
                primer_name: name.trim().to_string(),
                amplimers: Vec::new(),
            });
            expect_description = false;
            continue;
        }

        let Some(current) = results.last_mut() else {
            if line.is_empty() {
                continue;
            }
            return Err(format!("line {at}: content before first 'Primer name'"));
        };

        if line.starts_with("Amplimer ") && !line.starts_with("Amplimer length") {
            current.amplimers.push(Amplimer {
                sequence_id: String::new(),
                description: String::new(),
                start: 0,
                length: 0,
                forward_mismatches: 0,
                reverse_mismatches: 0,
            });
            expect_description = false;
            continue;
        }

        let Some(amplimer) = current.amplimers.last_mut() else {
            continue;
        };

        if let Some(id) = line.strip_prefix("Sequence:") {
            amplimer.sequence_id = id.trim().to_string();
            expect_description = true;
        } else if line.contains(" hits forward strand at ") {
            let (pos, mm) = parse_hit(line, "forward").map_err(|e| format!("line {at}: {e}"))?;
            amplimer.start = pos;
            amplimer.forward_mismatches = mm;
            check_end(amplimer, at)?;
            expect_description = false;
        } else if line.contains(" hits reverse strand at ") {
            let (_, mm) = parse_hit(line, "reverse").map_err(|e| format!("line {at}: {e}"))?;
            amplimer.reverse_mismatches = mm;
            expect_description = false;
        } else if let Some(rest) = line.strip_prefix("Amplimer length:") {
            amplimer.length = rest
                .trim()
                .trim_end_matches("bp")
                .trim()
                .parse()
                .map_err(|e| format!("line {at}: bad amplimer length: {e}"))?;
            check_end(amplimer, at)?;
            expect_description = false;
        } else if expect_description {
            amplimer.description = line.to_string();
            expect_description = false;
        }
    }

    for result in &results {
        if let Some(bad) = result
            .amplimers
            .iter()
            .find(|a| a.sequence_id.is_empty() || a.length == 0)
        {
            return Err(format!(
                "incomplete amplimer record for primer {} ({:?})",
                result.primer_name, bad.sequence_id
            ));
        }
    }
    Ok(results)
}

fn check_end(amplimer: &Amplimer, at: usize) -> std::result::Result<(), String> {
    match amplimer.end() {
        Some(_) => Ok(()),
        None => Err(format!(
            "line {at}: amplimer at {} with length {} overflows",
            amplimer.start, amplimer.length
        )),
    }
}

/// Extract position and mismatch count from a primer hit line.
fn parse_hit(line: &str, strand: &str) -> std::result::Result<(usize, u32), String> {
    let marker = format!(" hits {strand} strand at ");
    let rest = line
        .split_once(marker.as_str())
        .map(|(_, r)| r)
        .ok_or_else(|| format!("malformed {strand} hit"))?;
    let (pos, tail) = rest
        .split_once(" with ")
        .ok_or_else(|| format!("malformed {strand} hit"))?;
    let pos = pos
        .trim_matches(|c| c == '[' || c == ']')
        .parse()
        .map_err(|e| format!("bad {strand} position: {e}"))?;
    let mismatches = tail
        .split_whitespace()
        .next()
        .ok_or_else(|| format!("missing {strand} mismatch count"))?
        .parse()
        .map_err(|e| format!("bad {strand} mismatch count: {e}"))?;
    Ok((pos, mismatches))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "
Primer name gv1_p1
Amplimer 1
\tSequence: NC_004547
\tPectobacterium atrosepticum SCRI1043
\tACGTTGCA hits forward strand at 1201 with 0 mismatches
\tTTGACCAG hits reverse strand at [3411] with 1 mismatches
\tAmplimer length: 188 bp
Amplimer 2
\tSequence: plasmid1
\t
\tACGTTGCA hits forward strand at 5 with 2 mismatches
\tTTGACCAG hits reverse strand at [40] with 0 mismatches
\tAmplimer length: 30 bp

Primer name gv1_p2

Primer name gv1_p3
Amplimer 1
\tSequence: NC_004547
\tPectobacterium atrosepticum SCRI1043
\tGGGAAACC hits forward strand at 10 with 0 mismatches
\tCCAAAGGG hits reverse strand at [99] with 0 mismatches
\tAmplimer length: 61 bp
";

    #[test]
    fn parses_all_primers_and_amplimers() {
        let results = parse_report(REPORT).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].primer_name, "gv1_p1");
        assert_eq!(results[0].amplimers.len(), 2);
        assert!(results[1].amplimers.is_empty());
        assert_eq!(results[2].amplimers[0].length, 61);
    }

    #[test]
    fn amplimer_fields() {
        let results = parse_report(REPORT).unwrap();
        let a = &results[0].amplimers[0];
        assert_eq!(a.sequence_id, "NC_004547");
        assert_eq!(a.description, "Pectobacterium atrosepticum SCRI1043");
        assert_eq!(a.start, 1201);
        assert_eq!(a.length, 188);
        assert_eq!(a.forward_mismatches, 0);
        assert_eq!(a.reverse_mismatches, 1);
        assert_eq!(a.span(), 1200..1388);

        let b = &results[0].amplimers[1];
        assert_eq!(b.sequence_id, "plasmid1");
        assert_eq!(b.description, "");
        assert_eq!(b.forward_mismatches, 2);
    }

    #[test]
    fn empty_report() {
        assert!(parse_report("\n\n").unwrap().is_empty());
    }

    #[test]
    fn garbage_before_header_is_error() {
        assert!(parse_report("Amplimer 1\n").is_err());
    }

    #[test]
    fn bad_length_is_error() {
        let text = "Primer name p\nAmplimer 1\n\tSequence: s\n\tAmplimer length: lots bp\n";
        let err = parse_report(text).unwrap_err();
        assert!(err.contains("line 4"));
    }

    #[test]
    fn amplimer_end_past_usize_is_error() {
        let text = format!(
            "Primer name p\nAmplimer 1\n\tSequence: x\n\
             \tA hits forward strand at {} with 0 mismatches\n\
             \tAmplimer length: 5 bp\n",
            usize::MAX
        );
        let err = parse_report(&text).unwrap_err();
        assert!(err.contains("line 5"), "{err}");
        assert!(err.contains("overflows"));
    }

    #[test]
    fn huge_span_saturates() {
        let a = Amplimer {
            sequence_id: "x".into(),
            description: String::new(),
            start: usize::MAX,
            length: 5,
            forward_mismatches: 0,
            reverse_mismatches: 0,
        };
        assert_eq!(a.span().end, usize::MAX);
    }

    #[test]
    fn incomplete_amplimer_is_error() {
        let text = "Primer name p\nAmplimer 1\n\tSequence: s\n";
        assert!(parse_report(text).is_err());
    }
}
