//! Coverage tracks from molecule files, in the bedGraph format.

use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::chrom::ChromosomeName;
use crate::cigar::{self, CigarError, Strand};
use crate::packet::{MoleculePacket, PacketError};

/// Errors from coverage accumulation and output.
#[derive(Debug, Error)]
pub enum CoverageError {
    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Cigar(#[from] CigarError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Per-base read depth, accumulated separately for each chromosome strand.
///
/// Positions are 1-based along the reference; depth vectors grow on demand.
#[derive(Debug, Default)]
pub struct Coverage {
    depths: HashMap<(String, Strand), Vec<u32>>,
    chromosome_size_hint: usize,
}

impl Coverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A coverage track preallocating each chromosome's depth vector to the
    /// given number of bases. Purely a performance hint; vectors still grow
    /// past it on demand.
    pub fn with_chromosome_size_hint(bases: usize) -> Self {
        Self {
            depths: HashMap::new(),
            chromosome_size_hint: bases,
        }
    }

    /// Accumulate one aligned molecule.
    ///
    /// Only alignment runs that consume both query and reference count toward
    /// depth; skips and deletions advance along the reference without
    /// counting, and clips and insertions are ignored.
    pub fn add_alignment(
        &mut self,
        chrom: &str,
        strand: Strand,
        ref_start: u64,
        ref_cigar: &str,
    ) -> Result<(), CoverageError> {
        let runs = cigar::split(ref_cigar)?;
        let hint = self.chromosome_size_hint;
        let depth = self
            .depths
            .entry((chrom.to_string(), strand))
            .or_insert_with(|| Vec::with_capacity(hint));
        let mut position = ref_start as usize;
        for (op, length) in runs {
            let length = length as usize;
            if op.consumes_query() && op.consumes_ref() {
                if depth.len() < position + length {
                    depth.resize(position + length, 0);
                }
                for height in &mut depth[position..position + length] {
                    *height += 1;
                }
                position += length;
            } else if op.consumes_ref() {
                position += length;
            }
        }
        Ok(())
    }

    /// Accumulate every molecule in a CAMPAREE molecule file, using the
    /// molecules' source alignments.
    pub fn add_camparee_file(&mut self, molecule_file: &Path) -> Result<(), CoverageError> {
        let packet = MoleculePacket::from_camparee_file(molecule_file)?;
        info!(
            file = %molecule_file.display(),
            molecules = packet.molecules.len(),
            "accumulating coverage"
        );
        for molecule in &packet.molecules {
            self.add_alignment(
                &molecule.source_chrom,
                molecule.source_strand,
                molecule.source_start,
                &molecule.source_cigar,
            )?;
        }
        Ok(())
    }

    /// Coverage of a single CAMPAREE molecule file.
    pub fn from_camparee_file(molecule_file: &Path) -> Result<Self, CoverageError> {
        let mut coverage = Self::new();
        coverage.add_camparee_file(molecule_file)?;
        Ok(coverage)
    }

    /// Constant-depth blocks for one chromosome strand, as
    /// `(start, end, depth)` with 0-based half-open coordinates.
    ///
    /// Zero-depth blocks are omitted.
    fn blocks(depth: &[u32]) -> Vec<(u64, u64, u32)> {
        // Index i holds the depth at 1-based position i, so 0-based output
        // coordinates are i - 1.
        let mut blocks = Vec::new();
        let mut block_start = 0usize;
        let mut block_height = 0u32;
        let trimmed = depth.len() - depth.iter().rev().take_while(|&&h| h == 0).count();
        for (i, &height) in depth[..trimmed].iter().enumerate() {
            if i == 0 {
                block_height = height;
                continue;
            }
            if height != block_height {
                if block_height != 0 {
                    blocks.push((
                        block_start.saturating_sub(1) as u64,
                        (i - 1) as u64,
                        block_height,
                    ));
                }
                block_start = i;
                block_height = height;
            }
        }
        if block_height != 0 && trimmed > 0 {
            blocks.push((
                block_start.saturating_sub(1) as u64,
                (trimmed - 1) as u64,
                block_height,
            ));
        }
        blocks
    }

    /// Write forward- and reverse-strand bedGraph files.
    ///
    /// Two files are produced, `<prefix>.forward.cov` and
    /// `<prefix>.reverse.cov`; unspecified-strand alignments land in the
    /// reverse file with their '.' label intact. Chromosomes appear in
    /// [`ChromosomeName`] order. Returns the two paths.
    pub fn write_bedgraph(&self, output_prefix: &Path) -> Result<(PathBuf, PathBuf), CoverageError> {
        let prefix = output_prefix.display();
        let forward_path = PathBuf::from(format!("{prefix}.forward.cov"));
        let reverse_path = PathBuf::from(format!("{prefix}.reverse.cov"));
        let mut forward = BufWriter::new(std::fs::File::create(&forward_path)?);
        let mut reverse = BufWriter::new(std::fs::File::create(&reverse_path)?);

        writeln!(
            forward,
            "track type=bedGraph name=\"Coverage {prefix} forward strand\" \
             description=\"Coverage for {prefix} forward strand\" \
             visibility=full color=0,0,255 priority=20"
        )?;
        writeln!(
            reverse,
            "track type=bedGraph name=\"Coverage {prefix} reverse strand\" \
             description=\"Coverage for {prefix} reverse strand\" \
             visibility=full color=255,0,0 priority=20"
        )?;

        let mut keys: Vec<&(String, Strand)> = self.depths.keys().collect();
        keys.sort_by_cached_key(|(chrom, strand)| (ChromosomeName::new(chrom), *strand));
        for key @ (chrom, strand) in keys {
            let depth = &self.depths[key];
            let blocks = Self::blocks(depth);
            debug!(chrom, %strand, blocks = blocks.len(), "writing coverage track");
            let file = if *strand == Strand::Forward {
                &mut forward
            } else {
                &mut reverse
            };
            for (start, end, height) in blocks {
                writeln!(file, "{chrom}\t{start}\t{end}\t{height}")?;
            }
        }
        forward.flush()?;
        reverse.flush()?;
        Ok((forward_path, reverse_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn matches_accumulate_and_skips_do_not() {
        let mut coverage = Coverage::new();
        coverage
            .add_alignment("chr1", Strand::Forward, 3, "2M3N2M")
            .unwrap();
        coverage
            .add_alignment("chr1", Strand::Forward, 4, "1M")
            .unwrap();
        let depth = &coverage.depths[&("chr1".to_string(), Strand::Forward)];
        // Positions 3-4 and 8-9 are matched; 5-7 are skipped over.
        assert_eq!(depth[3], 1);
        assert_eq!(depth[4], 2);
        assert_eq!(depth[5], 0);
        assert_eq!(depth[8], 1);
        assert_eq!(depth[9], 1);
    }

    #[test]
    fn blocks_merge_constant_depth_and_skip_zeros() {
        // 1-based positions 2-3 at depth 1, 4 at depth 2.
        let depth = [0, 0, 1, 1, 2, 0];
        assert_eq!(Coverage::blocks(&depth), [(1, 3, 1), (3, 4, 2)]);
        assert_eq!(Coverage::blocks(&[]), []);
        assert_eq!(Coverage::blocks(&[0, 0]), []);
    }

    #[test]
    fn bedgraph_files_split_by_strand() {
        let mut coverage = Coverage::new();
        coverage
            .add_alignment("chr2", Strand::Forward, 1, "4M")
            .unwrap();
        coverage
            .add_alignment("chr1", Strand::Reverse, 10, "2M")
            .unwrap();

        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("sample1");
        let (forward_path, reverse_path) = coverage.write_bedgraph(&prefix).unwrap();

        let forward = std::fs::read_to_string(forward_path).unwrap();
        let mut lines = forward.lines();
        assert!(lines.next().unwrap().starts_with("track type=bedGraph"));
        assert_eq!(lines.next().unwrap(), "chr2\t0\t4\t1");

        let reverse = std::fs::read_to_string(reverse_path).unwrap();
        assert_eq!(reverse.lines().nth(1).unwrap(), "chr1\t9\t11\t1");
    }
}
