//! Plain FASTA reading.

use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

/// Errors raised while reading a FASTA file.
#[derive(Debug, Error)]
pub enum FastaError {
    /// Sequence data appeared before any `>` header line.
    #[error("sequence data on line {line} precedes any header")]
    MissingHeader { line: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A single named sequence from a FASTA file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    /// Header text after the `>` marker.
    pub name: String,
    /// Concatenated sequence lines.
    pub sequence: String,
}

/// Read the contents of a FASTA file.
///
/// Returns the records in input order. Multi-line sequences are joined and
/// trailing newlines stripped; no validation of the sequence alphabet is
/// performed here.
pub fn read_fasta(fasta_file: &Path) -> Result<Vec<FastaRecord>, FastaError> {
    let reader = BufReader::new(std::fs::File::open(fasta_file)?);
    let mut records: Vec<FastaRecord> = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(name) = line.strip_prefix('>') {
            records.push(FastaRecord {
                name: name.to_string(),
                sequence: String::new(),
            });
        } else if line.is_empty() {
            continue;
        } else {
            match records.last_mut() {
                Some(record) => record.sequence.push_str(&line),
                None => return Err(FastaError::MissingHeader { line: index + 1 }),
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_multi_line_records_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">chr1\nAGTC\nGGGA\n>chr2\nTTTT").unwrap();
        let records = read_fasta(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "chr1");
        assert_eq!(records[0].sequence, "AGTCGGGA");
        assert_eq!(records[1].name, "chr2");
        assert_eq!(records[1].sequence, "TTTT");
    }

    #[test]
    fn rejects_headerless_sequence() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "AGTC").unwrap();
        assert!(matches!(
            read_fasta(file.path()),
            Err(FastaError::MissingHeader { line: 1 })
        ));
    }
}
