//! Simulated RNA/DNA molecules.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cigar::{self, CigarError, Strand};

/// Monotonic source for new molecule ids.
static NEXT_MOLECULE_ID: AtomicU64 = AtomicU64::new(1);

/// Header line for molecule log files.
pub const LOG_HEADER: &str = "#molecule_id\ttranscript_id\tsequence\tstart\tcigar\tsource_start\tsource_cigar\tsource_strand\tsource_chrom\tnote\n";

const SERIALIZED_FIELDS: usize = 9;

/// Errors from molecule edits and parsing.
#[derive(Debug, Error)]
pub enum MoleculeError {
    #[error("position {position} is not along the molecule (1-based, length {length})")]
    BadPosition { position: u64, length: u64 },

    #[error("cannot delete past the end of a molecule")]
    DeletionPastEnd,

    #[error("operation would leave behind a molecule with zero length")]
    WouldBeEmpty,

    #[error("fragment range {start}..={end} is not within the molecule (length {length})")]
    BadRange { start: u64, end: u64, length: u64 },

    #[error("molecule {id} has a disallowed base {base:?}")]
    DisallowedBase { id: String, base: char },

    #[error("start positions must be positive (1-based)")]
    BadStart,

    #[error("serialized molecule has {found} fields, expected {expected}")]
    FieldCount { expected: usize, found: usize },

    #[error("could not parse field {field}: {value:?}")]
    BadField { field: &'static str, value: String },

    #[error(transparent)]
    Cigar(#[from] CigarError),
}

/// A molecule of RNA or DNA.
///
/// All start positions and edit positions are 1-based.
///
/// `start`/`cigar` give the alignment relative to the *parent* molecule,
/// whatever molecule this one came from; they only reflect the most recent
/// operation. `source_start`/`source_cigar` give the alignment relative to a
/// *source* molecule (generally the reference genome) and are updated by
/// every operation so they keep pointing at the same source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub id: String,
    pub sequence: String,
    /// 1-based start on the parent molecule.
    pub start: u64,
    /// Alignment to the parent molecule, i.e. the previous step only.
    pub cigar: String,
    pub strand: Strand,
    pub transcript_id: Option<String>,
    /// 1-based start on the source molecule (reference genome).
    pub source_start: u64,
    pub source_cigar: String,
    pub source_strand: Strand,
    pub source_chrom: String,
}

impl Molecule {
    /// Create a molecule aligned to its parent.
    ///
    /// The source alignment defaults to the parent alignment.
    pub fn new(
        id: impl Into<String>,
        sequence: impl Into<String>,
        start: u64,
        cigar: impl Into<String>,
    ) -> Result<Self, MoleculeError> {
        if start == 0 {
            return Err(MoleculeError::BadStart);
        }
        let cigar = cigar.into();
        Ok(Self {
            id: id.into(),
            sequence: sequence.into().trim().to_string(),
            start,
            source_start: start,
            source_cigar: cigar.clone(),
            cigar,
            strand: Strand::Unspecified,
            transcript_id: None,
            source_strand: Strand::Unspecified,
            source_chrom: String::new(),
        })
    }

    #[must_use]
    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    #[must_use]
    pub fn with_transcript_id(mut self, transcript_id: impl Into<String>) -> Self {
        self.transcript_id = Some(transcript_id.into());
        self
    }

    #[must_use]
    pub fn with_source_alignment(
        mut self,
        source_start: u64,
        source_cigar: impl Into<String>,
        source_strand: Strand,
        source_chrom: impl Into<String>,
    ) -> Self {
        self.source_start = source_start;
        self.source_cigar = source_cigar.into();
        self.source_strand = source_strand;
        self.source_chrom = source_chrom.into();
        self
    }

    /// Allocate a fresh id, qualified by the parent's id.
    pub fn new_id(parent_id: &str) -> String {
        let serial = NEXT_MOLECULE_ID.fetch_add(1, Ordering::Relaxed);
        format!("{parent_id}.{serial}")
    }

    pub fn len(&self) -> u64 {
        self.sequence.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Check the sequence against the allowed alphabet (A, C, G, T, N).
    pub fn validate(&self) -> Result<(), MoleculeError> {
        match self.sequence.chars().find(|c| !matches!(c, 'A' | 'C' | 'G' | 'T' | 'N')) {
            Some(base) => Err(MoleculeError::DisallowedBase {
                id: self.id.clone(),
                base,
            }),
            None => Ok(()),
        }
    }

    /// Length of the poly-A tail, 0 if there is none.
    pub fn poly_a_tail_length(&self) -> u64 {
        self.sequence
            .chars()
            .rev()
            .take_while(|&c| c == 'A')
            .count() as u64
    }

    /// Length of the longest stretch of A bases anywhere in the sequence.
    pub fn longest_poly_a_stretch(&self) -> u64 {
        let mut longest = 0;
        let mut current = 0;
        for c in self.sequence.chars() {
            if c == 'A' {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 0;
            }
        }
        longest
    }

    /// Rechain the source alignment after an edit described by `step_cigar`.
    fn apply_step(&mut self, step_cigar: String) -> Result<(), MoleculeError> {
        let (source_start, source_cigar, source_strand) = cigar::chain(
            self.start,
            &step_cigar,
            Strand::Forward,
            self.source_start,
            &self.source_cigar,
            self.source_strand,
        )?;
        self.cigar = step_cigar;
        self.source_start = source_start;
        self.source_cigar = source_cigar;
        self.source_strand = source_strand;
        Ok(())
    }

    /// Substitute a single base at a 1-based position.
    ///
    /// Alignments are unchanged; a substitution consumes the same query and
    /// reference bases as the original.
    pub fn substitute(&mut self, nucleotide: char, position: u64) -> Result<(), MoleculeError> {
        let length = self.len();
        if position == 0 || position > length {
            return Err(MoleculeError::BadPosition { position, length });
        }
        let idx = (position - 1) as usize;
        self.sequence.replace_range(idx..=idx, &nucleotide.to_string());
        Ok(())
    }

    /// Insert a sequence before a 1-based position.
    ///
    /// Position 1 prepends to the 5' end; position `len + 1` appends to the
    /// 3' end.
    pub fn insert(&mut self, insertion: &str, position: u64) -> Result<(), MoleculeError> {
        let length = self.len();
        if position == 0 || position > length + 1 {
            return Err(MoleculeError::BadPosition { position, length });
        }
        let idx = (position - 1) as usize;
        let step = cigar::unsplit(&[
            (cigar::CigarOp::Match, idx as u64),
            (cigar::CigarOp::Insertion, insertion.len() as u64),
            (cigar::CigarOp::Match, length - idx as u64),
        ]);
        self.sequence.insert_str(idx, insertion);
        self.apply_step(step)
    }

    /// Delete `deletion_length` bases starting at a 1-based position.
    ///
    /// Deleting past the end or deleting the entire molecule is an error.
    pub fn delete(&mut self, deletion_length: u64, position: u64) -> Result<(), MoleculeError> {
        let length = self.len();
        if position == 0 || position > length {
            return Err(MoleculeError::BadPosition { position, length });
        }
        let idx = position - 1;
        if idx + deletion_length > length {
            return Err(MoleculeError::DeletionPastEnd);
        }
        if deletion_length >= length {
            return Err(MoleculeError::WouldBeEmpty);
        }
        let step = cigar::unsplit(&[
            (cigar::CigarOp::Match, idx),
            (cigar::CigarOp::Deletion, deletion_length),
            (cigar::CigarOp::Match, length - idx - deletion_length),
        ]);
        self.sequence
            .replace_range(idx as usize..(idx + deletion_length) as usize, "");
        self.apply_step(step)
    }

    /// Truncate (break) the molecule at a 1-based position.
    ///
    /// The molecule retains its 3' end: the base at `position` becomes the
    /// new first base, so truncation removes the 5' side.
    pub fn truncate(&mut self, position: u64) -> Result<(), MoleculeError> {
        let length = self.len();
        if position == 0 || position > length {
            return Err(MoleculeError::BadPosition { position, length });
        }
        self.start += position - 1;
        self.sequence.replace_range(..(position - 1) as usize, "");
        if self.sequence.is_empty() {
            return Err(MoleculeError::WouldBeEmpty);
        }
        let step = format!("{}M", self.sequence.len());
        self.apply_step(step)
    }

    /// Derive a smaller molecule covering the closed 1-based range
    /// `start..=end` of this molecule.
    pub fn fragment(&self, start: u64, end: u64) -> Result<Molecule, MoleculeError> {
        let length = self.len();
        if start == 0 || start >= end || end > length {
            return Err(MoleculeError::BadRange { start, end, length });
        }
        let sequence = &self.sequence[(start - 1) as usize..end as usize];
        // Fragments match their parents.
        let frag_cigar = format!("{}M", sequence.len());
        let (source_start, source_cigar, source_strand) = cigar::chain(
            start,
            &frag_cigar,
            Strand::Forward,
            self.source_start,
            &self.source_cigar,
            self.source_strand,
        )?;

        let mut fragment = Molecule::new(Molecule::new_id(&self.id), sequence, start, frag_cigar)?
            .with_source_alignment(source_start, source_cigar, source_strand, &*self.source_chrom);
        fragment.transcript_id = self.transcript_id.clone();
        Ok(fragment)
    }

    /// Render the molecule as a single tab-delimited line.
    pub fn serialize(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.sequence,
            self.start,
            self.cigar,
            self.transcript_id.as_deref().unwrap_or_default(),
            self.source_start,
            self.source_cigar,
            self.source_strand,
            self.source_chrom,
        )
    }

    /// Re-render a serialized line back into a `Molecule`.
    ///
    /// Any leading hash is stripped before unpacking.
    pub fn deserialize(data: &str) -> Result<Self, MoleculeError> {
        let data = data.strip_prefix('#').unwrap_or(data);
        let fields: Vec<&str> = data.trim_end_matches('\n').split('\t').collect();
        if fields.len() != SERIALIZED_FIELDS {
            return Err(MoleculeError::FieldCount {
                expected: SERIALIZED_FIELDS,
                found: fields.len(),
            });
        }
        let start = fields[2].parse().map_err(|_| MoleculeError::BadField {
            field: "start",
            value: fields[2].to_string(),
        })?;
        let source_start = fields[5].parse().map_err(|_| MoleculeError::BadField {
            field: "source_start",
            value: fields[5].to_string(),
        })?;
        let source_strand = fields[7].parse().map_err(|_| MoleculeError::BadField {
            field: "source_strand",
            value: fields[7].to_string(),
        })?;
        let mut molecule = Molecule::new(fields[0], fields[1], start, fields[3])?
            .with_source_alignment(source_start, fields[6], source_strand, fields[8]);
        if !fields[4].is_empty() && fields[4] != "None" {
            molecule.transcript_id = Some(fields[4].to_string());
        }
        Ok(molecule)
    }

    /// One line for the molecule log, matching [`LOG_HEADER`].
    pub fn log_entry(&self, note: &str) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            self.id,
            self.transcript_id.as_deref().unwrap_or_default(),
            self.sequence,
            self.start,
            self.cigar,
            self.source_start,
            self.source_cigar,
            self.source_strand,
            self.source_chrom,
            note,
        )
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Molecule(id: {}, start: {}, cigar: {}, source: {}:{}{} {})",
            self.id,
            self.start,
            self.cigar,
            self.source_chrom,
            self.source_start,
            self.source_strand,
            self.source_cigar,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn molecule(sequence: &str) -> Molecule {
        let cigar = format!("{}M", sequence.len());
        Molecule::new("1", sequence, 1, cigar).unwrap()
    }

    #[test]
    fn substitution_leaves_alignment_alone() {
        let mut m = molecule("AGTTCAAGCT");
        m.substitute('C', 3).unwrap();
        assert_eq!(m.sequence, "AGCTCAAGCT");
        assert_eq!(m.cigar, "10M");
        assert_eq!(m.source_cigar, "10M");
    }

    #[test]
    fn insertion_updates_source_cigar() {
        let mut m = molecule("AGTTCAAGCT");
        m.insert("GGG", 4).unwrap();
        assert_eq!(m.sequence, "AGTGGGTCAAGCT");
        assert_eq!(m.cigar, "3M3I7M");
        assert_eq!(m.source_cigar, "3M3I7M");
        assert_eq!(m.source_start, 1);
    }

    #[test]
    fn insertion_at_either_end() {
        let mut m = molecule("AGTT");
        m.insert("CC", 1).unwrap();
        assert_eq!(m.sequence, "CCAGTT");
        assert_eq!(m.cigar, "2I4M");

        let mut m = molecule("AGTT");
        m.insert("CC", 5).unwrap();
        assert_eq!(m.sequence, "AGTTCC");
        assert_eq!(m.cigar, "4M2I");
    }

    #[test]
    fn deletion_updates_source_cigar() {
        let mut m = molecule("AGTTCAAGCT");
        m.delete(2, 3).unwrap();
        assert_eq!(m.sequence, "AGCAAGCT");
        assert_eq!(m.cigar, "2M2D6M");
        assert_eq!(m.source_cigar, "2M2D6M");
    }

    #[test]
    fn deletion_cannot_remove_everything() {
        let mut m = molecule("AGTT");
        assert!(matches!(m.delete(4, 1), Err(MoleculeError::WouldBeEmpty)));
        assert!(matches!(m.delete(3, 3), Err(MoleculeError::DeletionPastEnd)));
    }

    #[test]
    fn truncation_keeps_three_prime_end() {
        let mut m = molecule("AGTTCAAGCT");
        m.truncate(4).unwrap();
        assert_eq!(m.sequence, "TCAAGCT");
        assert_eq!(m.start, 4);
        assert_eq!(m.cigar, "7M");
        assert_eq!(m.source_start, 4);
        assert_eq!(m.source_cigar, "7M");
    }

    #[test]
    fn fragment_carries_source_alignment() {
        let parent = molecule("AGTTCAAGCTTGCACTCTAG")
            .with_source_alignment(101, "20M", Strand::Forward, "chr7");
        let frag = parent.fragment(3, 8).unwrap();
        assert_eq!(frag.sequence, "TTCAAG");
        assert_eq!(frag.cigar, "6M");
        assert_eq!(frag.source_start, 103);
        assert_eq!(frag.source_cigar, "6M");
        assert_eq!(frag.source_chrom, "chr7");
        assert!(frag.id.starts_with("1."));
    }

    #[test]
    fn fragment_rejects_bad_ranges() {
        let m = molecule("AGTT");
        assert!(m.fragment(3, 3).is_err());
        assert!(m.fragment(1, 9).is_err());
    }

    #[test]
    fn poly_a_metrics() {
        let m = molecule("AAGTTCAAAGCTAAAA");
        assert_eq!(m.poly_a_tail_length(), 4);
        assert_eq!(m.longest_poly_a_stretch(), 4);
        let m = molecule("GTC");
        assert_eq!(m.poly_a_tail_length(), 0);
        assert_eq!(m.longest_poly_a_stretch(), 0);
    }

    #[test]
    fn validation_flags_disallowed_bases() {
        let m = molecule("AGUC");
        assert!(matches!(
            m.validate(),
            Err(MoleculeError::DisallowedBase { base: 'U', .. })
        ));
        assert!(molecule("AGTCN").validate().is_ok());
    }

    #[test]
    fn serialization_round_trips() {
        let m = molecule("AGTTCAAGCT")
            .with_transcript_id("ENST0001")
            .with_source_alignment(500, "4M2D6M", Strand::Reverse, "chr2");
        let restored = Molecule::deserialize(&m.serialize()).unwrap();
        assert_eq!(restored, m);
    }

    #[test]
    fn new_ids_are_unique_and_qualified() {
        let a = Molecule::new_id("12");
        let b = Molecule::new_id("12");
        assert_ne!(a, b);
        assert!(a.starts_with("12."));
    }
}
