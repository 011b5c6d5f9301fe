//! CIGAR string manipulation.
//!
//! From the SAM format description:
//!
//! ```text
//!                                                           Consumes  Consumes
//!  Code Description                                           Query   Reference
//!  -------------------------------------------------------------------------
//!     M alignment match (sequence match or mismatch)          yes     yes
//!     I insertion to the reference                            yes     no
//!     D deletion from the reference                           no      yes
//!     N skipped region from the reference                     no      yes
//!     S soft clipping (clipped sequences present in SEQ)      yes     no
//!     H hard clipping (clipped sequences NOT present in SEQ)  no      no
//!     P padding (silent deletion from padded reference)       no      no
//!     = sequence match                                        yes     yes
//!     X sequence mismatch                                     yes     yes
//!  -------------------------------------------------------------------------
//! ```
//!
//! The important entry point is [`chain`], which applies one alignment on top
//! of another. All start positions are 1-based.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{self, UtilError};

/// Errors from CIGAR parsing and chaining.
#[derive(Debug, Error)]
pub enum CigarError {
    #[error("invalid cigar string {0:?}")]
    Invalid(String),

    /// H and P consume neither query nor reference; chaining them through an
    /// alignment is not meaningful.
    #[error("cannot handle cigar code {0}")]
    Unsupported(char),

    #[error("start positions must be positive (1-based)")]
    BadStart,

    /// The outer alignment ran past the end of the inner query. The inputs
    /// were not a true A-to-B-to-C alignment pair.
    #[error("alignment extends past the end of the inner query sequence")]
    PastEnd,

    #[error("invalid strand {0:?}")]
    BadStrand(String),

    #[error(transparent)]
    Util(#[from] UtilError),
}

/// Strand of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
    /// Strand not recorded; treated as forward when chaining.
    #[default]
    Unspecified,
}

impl Strand {
    pub fn is_reverse(self) -> bool {
        matches!(self, Strand::Reverse)
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Unspecified => '.',
        };
        write!(f, "{symbol}")
    }
}

impl FromStr for Strand {
    type Err = CigarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "." | "" => Ok(Strand::Unspecified),
            other => Err(CigarError::BadStrand(other.to_string())),
        }
    }
}

/// A single CIGAR operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    HardClip,
    Padding,
    SeqMatch,
    SeqMismatch,
}

impl CigarOp {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(CigarOp::Match),
            'I' => Some(CigarOp::Insertion),
            'D' => Some(CigarOp::Deletion),
            'N' => Some(CigarOp::Skip),
            'S' => Some(CigarOp::SoftClip),
            'H' => Some(CigarOp::HardClip),
            'P' => Some(CigarOp::Padding),
            '=' => Some(CigarOp::SeqMatch),
            'X' => Some(CigarOp::SeqMismatch),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::Insertion => 'I',
            CigarOp::Deletion => 'D',
            CigarOp::Skip => 'N',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
            CigarOp::Padding => 'P',
            CigarOp::SeqMatch => '=',
            CigarOp::SeqMismatch => 'X',
        }
    }

    /// Whether the op advances along the query sequence.
    pub fn consumes_query(self) -> bool {
        matches!(
            self,
            CigarOp::Match
                | CigarOp::Insertion
                | CigarOp::SoftClip
                | CigarOp::SeqMatch
                | CigarOp::SeqMismatch
        )
    }

    /// Whether the op advances along the reference sequence.
    pub fn consumes_ref(self) -> bool {
        matches!(
            self,
            CigarOp::Match
                | CigarOp::Deletion
                | CigarOp::Skip
                | CigarOp::SeqMatch
                | CigarOp::SeqMismatch
        )
    }
}

/// One run of a CIGAR string: an operation and its length.
pub type Run = (CigarOp, u64);

/// Parse a CIGAR string into a list of operation runs.
pub fn split(cigar: &str) -> Result<Vec<Run>, CigarError> {
    let mut runs = Vec::new();
    let mut length: u64 = 0;
    let mut saw_digit = false;
    for ch in cigar.chars() {
        if let Some(digit) = ch.to_digit(10) {
            length = length
                .checked_mul(10)
                .and_then(|l| l.checked_add(u64::from(digit)))
                .ok_or_else(|| CigarError::Invalid(cigar.to_string()))?;
            saw_digit = true;
        } else {
            let op = CigarOp::from_code(ch).ok_or_else(|| CigarError::Invalid(cigar.to_string()))?;
            if !saw_digit {
                return Err(CigarError::Invalid(cigar.to_string()));
            }
            runs.push((op, length));
            length = 0;
            saw_digit = false;
        }
    }
    if saw_digit {
        return Err(CigarError::Invalid(cigar.to_string()));
    }
    Ok(runs)
}

/// Construct a CIGAR string from operation runs.
///
/// Drops zero-length runs and coalesces adjacent runs of the same op.
pub fn unsplit(runs: &[Run]) -> String {
    let mut pieces: Vec<Run> = Vec::with_capacity(runs.len());
    for &(op, length) in runs {
        if length == 0 {
            continue;
        }
        match pieces.last_mut() {
            Some((last_op, last_length)) if *last_op == op => *last_length += length,
            _ => pieces.push((op, length)),
        }
    }
    pieces
        .iter()
        .map(|(op, length)| format!("{length}{}", op.code()))
        .collect()
}

/// Length of the query sequence implied by the runs.
///
/// The reference length is not recorded in a CIGAR string.
pub fn query_len(runs: &[Run]) -> u64 {
    runs.iter()
        .filter(|(op, _)| op.consumes_query())
        .map(|(_, length)| length)
        .sum()
}

/// Number of bases the runs consume on the reference.
pub fn ref_len(runs: &[Run]) -> u64 {
    runs.iter()
        .filter(|(op, _)| op.consumes_ref())
        .map(|(_, length)| length)
        .sum()
}

/// Cursor walking an alignment of the middle sequence onto the reference.
struct AlignmentWalker {
    runs: VecDeque<Run>,
    /// 1-based position on the middle (inner query) sequence.
    middle: u64,
    /// 1-based position on the reference sequence.
    reference: u64,
}

impl AlignmentWalker {
    fn new(runs: Vec<Run>, reference_start: u64) -> Self {
        Self {
            runs: runs.into(),
            middle: 1,
            reference: reference_start,
        }
    }

    /// Advance along the middle sequence to `target`, returning the runs
    /// traversed and the distance moved on the reference.
    fn advance_to(&mut self, target: u64) -> Result<(Vec<Run>, u64), CigarError> {
        let mut skipped = 0;
        let mut used = Vec::new();
        while self.middle < target {
            let (op, mut length) = self.runs.pop_front().ok_or(CigarError::PastEnd)?;
            if op.consumes_query() {
                if length + self.middle > target {
                    // Truncate the run so we stop exactly at the target.
                    let remaining = length + self.middle - target;
                    length = target - self.middle;
                    self.runs.push_front((op, remaining));
                }
                self.middle += length;
            }
            if op.consumes_ref() {
                self.reference += length;
                skipped += length;
            }
            used.push((op, length));
        }
        Ok((used, skipped))
    }
}

/// Chain two alignments.
///
/// Given `start1`/`cigar1`/`strand1` aligning A to B, and
/// `start2`/`cigar2`/`strand2` aligning B to C, produce the start, cigar, and
/// strand aligning A to C.
///
/// The outer alignment must genuinely fit within the inner query; if
/// `cigar1` implies a longer alignment than B supports this returns
/// [`CigarError::PastEnd`].
pub fn chain(
    start1: u64,
    cigar1: &str,
    strand1: Strand,
    start2: u64,
    cigar2: &str,
    strand2: Strand,
) -> Result<(u64, String, Strand), CigarError> {
    if start1 == 0 || start2 == 0 {
        return Err(CigarError::BadStart);
    }

    let mut outer = split(cigar1)?;
    let inner = split(cigar2)?;

    let match_length = ref_len(&outer);
    let middle_length = query_len(&inner);

    let mut start1 = start1;
    if strand2.is_reverse() {
        outer.reverse();
        let flipped = (middle_length as i64) - (start1 as i64) - (match_length as i64) + 2;
        if flipped < 1 {
            return Err(CigarError::PastEnd);
        }
        start1 = flipped as u64;
    }

    let mut walker = AlignmentWalker::new(inner, start2);
    walker.advance_to(start1)?;
    if walker.middle != start1 {
        return Err(CigarError::PastEnd);
    }

    let result_start = walker.reference;
    let mut result: Vec<Run> = Vec::new();

    // Advance through each run of the outer cigar, recording where it falls
    // on the reference.
    for (op, length) in outer {
        if op.consumes_query() {
            if op.consumes_ref() {
                // Collect every inner run between the start and end of this run.
                let target = walker.middle + length;
                let (used, _) = walker.advance_to(target)?;
                result.extend(used);
            } else {
                result.push((op, length));
            }
        } else if op.consumes_ref() {
            let target = walker.middle + length;
            let (_, skipped) = walker.advance_to(target)?;
            result.push((op, skipped));
        } else {
            return Err(CigarError::Unsupported(op.code()));
        }
    }

    let result_strand = if strand1.is_reverse() == strand2.is_reverse() {
        Strand::Forward
    } else {
        Strand::Reverse
    };

    Ok((result_start, unsplit(&result), result_strand))
}

/// Recover the query sequence of an alignment from its reference.
///
/// Insertions (and soft clips) are filled with `N`s. Reverse-strand
/// alignments are reverse complemented so the result reads 5' to 3'.
pub fn query_from_alignment(
    start: u64,
    cigar: &str,
    strand: Strand,
    reference: &str,
) -> Result<String, CigarError> {
    if start == 0 {
        return Err(CigarError::BadStart);
    }
    let mut index = (start - 1) as usize;
    let mut pieces = String::new();
    for (op, length) in split(cigar)? {
        let length = length as usize;
        if op.consumes_query() {
            if op.consumes_ref() {
                let slice = reference
                    .get(index..index + length)
                    .ok_or(CigarError::PastEnd)?;
                pieces.push_str(slice);
                index += length;
            } else {
                pieces.extend(std::iter::repeat_n('N', length));
            }
        } else if op.consumes_ref() {
            index += length;
        } else {
            return Err(CigarError::Unsupported(op.code()));
        }
    }
    if strand.is_reverse() {
        pieces = util::reverse_complement(&pieces)?;
    }
    Ok(pieces)
}
