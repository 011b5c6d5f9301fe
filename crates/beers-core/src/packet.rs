//! Molecule packets, the unit of work handed between pipeline steps.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cigar::Strand;
use crate::molecule::{Molecule, MoleculeError};
use crate::sample::{Sample, SampleError};

static NEXT_PACKET_ID: AtomicU64 = AtomicU64::new(0);

/// Errors from reading or writing molecule packet files.
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("packet file is missing its {0} header line")]
    MissingHeader(&'static str),

    #[error("packet id {0:?} is not a number")]
    BadPacketId(String),

    #[error("molecule line {line} has {found} fields, expected {expected}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("could not parse field {field} on line {line}: {value:?}")]
    BadField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("molecule on line {line}: {source}")]
    Molecule {
        line: usize,
        source: MoleculeError,
    },

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A collection of molecules from a single sample, processed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculePacket {
    pub id: u64,
    pub sample: Sample,
    pub molecules: Vec<Molecule>,
}

impl MoleculePacket {
    pub fn new(id: u64, sample: Sample, molecules: Vec<Molecule>) -> Self {
        Self {
            id,
            sample,
            molecules,
        }
    }

    /// Allocate the next packet id.
    pub fn new_id() -> u64 {
        NEXT_PACKET_ID.fetch_add(1, Ordering::Relaxed)
    }

    /// Write the packet to a file.
    ///
    /// The format is two hash-prefixed header lines (packet id, then the
    /// serialized sample) followed by one serialized molecule per line.
    pub fn write_to_file(&self, file_path: &Path) -> Result<(), PacketError> {
        let mut writer = BufWriter::new(std::fs::File::create(file_path)?);
        writeln!(writer, "#{}", self.id)?;
        writeln!(writer, "#{}", self.sample.serialize())?;
        for molecule in &self.molecules {
            writeln!(writer, "{}", molecule.serialize())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a packet written by [`MoleculePacket::write_to_file`].
    pub fn read_from_file(file_path: &Path) -> Result<Self, PacketError> {
        let reader = BufReader::new(std::fs::File::open(file_path)?);
        let mut lines = reader.lines();

        let id_line = lines
            .next()
            .transpose()?
            .ok_or(PacketError::MissingHeader("packet id"))?;
        let id_text = id_line.strip_prefix('#').unwrap_or(&id_line);
        let id = id_text
            .trim()
            .parse()
            .map_err(|_| PacketError::BadPacketId(id_text.to_string()))?;

        let sample_line = lines
            .next()
            .transpose()?
            .ok_or(PacketError::MissingHeader("sample"))?;
        let sample = Sample::deserialize(&sample_line)?;

        let mut molecules = Vec::new();
        for (index, line) in lines.enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let molecule = Molecule::deserialize(&line).map_err(|source| PacketError::Molecule {
                line: index + 3,
                source,
            })?;
            molecules.push(molecule);
        }
        Ok(Self::new(id, sample, molecules))
    }

    /// Load a CAMPAREE text molecule file as a packet.
    ///
    /// CAMPAREE assigns neither sample names nor packet ids, so both come from
    /// the file's location: the sample is the parent directory name and the
    /// packet id is the first number in the file name (0 if there is none).
    pub fn from_camparee_file(file_path: &Path) -> Result<Self, PacketError> {
        let sample_id = file_path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sample = Sample::new(sample_id.clone(), sample_id);

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        // First digit run in the file name names the packet.
        static PACKET_ID_PATTERN: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\d+").unwrap());
        let id = PACKET_ID_PATTERN
            .find(&file_name)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);

        let reader = BufReader::new(std::fs::File::open(file_path)?);
        let mut molecules = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            molecules.push(Self::molecule_from_camparee_line(&line, index + 1)?);
        }
        Ok(Self::new(id, sample, molecules))
    }

    fn molecule_from_camparee_line(line: &str, line_number: usize) -> Result<Molecule, PacketError> {
        // transcript_id, chrom, parental start/cigar, reference start/cigar,
        // strand, sequence.
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() != 8 {
            return Err(PacketError::FieldCount {
                line: line_number,
                expected: 8,
                found: fields.len(),
            });
        }
        let transcript_id = fields[0];
        let chrom = fields[1];
        let source_start: u64 = fields[4].parse().map_err(|_| PacketError::BadField {
            line: line_number,
            field: "reference start",
            value: fields[4].to_string(),
        })?;
        let source_strand: Strand = fields[6].parse().map_err(|_| PacketError::BadField {
            line: line_number,
            field: "strand",
            value: fields[6].to_string(),
        })?;
        let sequence = fields[7];

        // The molecule is its own parent, so it spans itself exactly.
        let cigar = format!("{}M", sequence.len());
        let molecule = Molecule::new(Molecule::new_id(transcript_id), sequence, 1, cigar)
            .map_err(|source| PacketError::Molecule {
                line: line_number,
                source,
            })?
            .with_strand(Strand::Forward)
            .with_transcript_id(transcript_id)
            .with_source_alignment(source_start, fields[5], source_strand, chrom);
        Ok(molecule)
    }
}
