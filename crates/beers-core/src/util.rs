//! Small utilities with wide applicability across the BEERS suite.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::constants::FILES_PER_DIRECTORY_LIMIT;

/// Errors from the general utilities.
#[derive(Debug, Error)]
pub enum UtilError {
    /// A sequence contained a base with no complement entry.
    #[error("cannot complement unknown base {0:?}")]
    UnknownBase(char),

    /// A directory-layout description could not be interpreted.
    #[error("invalid directory layout {layout:?}: {detail}")]
    BadLayout { layout: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Provide a 32-bit RNG seed from a seconds-based timestamp.
///
/// Timestamps wider than 32 bits are masked down to their low 32 bits.
pub fn generate_seed() -> u32 {
    (Utc::now().timestamp() & 0xffff_ffff) as u32
}

fn complement(base: char) -> Result<char, UtilError> {
    // T is used rather than U even for RNA. Ns complement to themselves so
    // that reads containing them can still be reverse complemented.
    match base {
        'A' => Ok('T'),
        'T' => Ok('A'),
        'G' => Ok('C'),
        'C' => Ok('G'),
        'N' => Ok('N'),
        other => Err(UtilError::UnknownBase(other)),
    }
}

/// Complement the given strand and return it in the 5' to 3' direction.
pub fn reverse_complement(strand: &str) -> Result<String, UtilError> {
    strand.chars().rev().map(complement).collect()
}

/// Create nested, numbered subdirectories under `directory_path` such that no
/// directory ends up holding more than [`FILES_PER_DIRECTORY_LIMIT`] entries.
///
/// Returns a comma-separated description of the layout: one value per nesting
/// level giving the number of directories created on that level. The
/// description can be fed back to [`output_subdirectories`] to locate the
/// directory a given packet file belongs in.
pub fn create_subdirectories(file_count: u64, directory_path: &Path) -> Result<String, UtilError> {
    let mut structure = Vec::new();
    create_nested(file_count, &mut structure, directory_path, 0)?;
    Ok(structure
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(","))
}

fn create_nested(
    file_count: u64,
    structure: &mut Vec<u64>,
    directory_path: &Path,
    depth: usize,
) -> Result<(), UtilError> {
    let full = file_count / FILES_PER_DIRECTORY_LIMIT;
    let partial = u64::from(file_count % FILES_PER_DIRECTORY_LIMIT != 0);
    let to_create = (full + partial).min(FILES_PER_DIRECTORY_LIMIT);
    if structure.len() <= depth {
        structure.push(to_create);
    }
    let remaining = file_count.saturating_sub(to_create * FILES_PER_DIRECTORY_LIMIT);
    for subdirectory_id in 0..to_create {
        let subdirectory_path = directory_path.join(subdirectory_id.to_string());
        std::fs::create_dir_all(&subdirectory_path)?;
        if remaining > 0 {
            create_nested(remaining, structure, &subdirectory_path, depth + 1)?;
        }
    }
    Ok(())
}

/// Map a packet id back to the chain of subdirectory names that hold its
/// files, given the layout description from [`create_subdirectories`].
///
/// The packet id is treated as the `(id + 1)`th file written into the layout.
pub fn output_subdirectories(packet_id: u64, layout: &str) -> Result<Vec<PathBuf>, UtilError> {
    let counts: Vec<u64> = layout
        .split(',')
        .map(|value| {
            value.parse::<u64>().map_err(|_| UtilError::BadLayout {
                layout: layout.to_string(),
                detail: format!("{value:?} is not a directory count"),
            })
        })
        .collect::<Result<_, _>>()?;
    if counts.contains(&0) {
        return Err(UtilError::BadLayout {
            layout: layout.to_string(),
            detail: "directory counts must be positive".to_string(),
        });
    }

    let mut counts = counts;
    let mut subdirectories = Vec::with_capacity(counts.len());
    let mut remaining = packet_id;
    // Edge case: everything fits into one directory, so the level capacity is
    // the per-directory limit rather than the (smaller) directory product.
    let mut level_capacity = counts
        .iter()
        .product::<u64>()
        .max(FILES_PER_DIRECTORY_LIMIT);
    let nesting_depth = counts.len();
    for _ in 0..nesting_depth {
        if level_capacity == 0 {
            return Err(UtilError::BadLayout {
                layout: layout.to_string(),
                detail: format!("too many nesting levels ({nesting_depth})"),
            });
        }
        subdirectories.push(PathBuf::from((remaining / level_capacity).to_string()));
        remaining %= level_capacity;
        level_capacity /= counts.pop().unwrap_or(1);
    }
    Ok(subdirectories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn seed_fits_in_32_bits() {
        // Nothing to assert beyond it not panicking; the mask is the contract.
        let _ = generate_seed();
    }

    #[test]
    fn reverse_complement_returns_five_prime_to_three_prime() {
        assert_eq!(reverse_complement("AGTC").unwrap(), "GACT");
        assert_eq!(reverse_complement("AAAN").unwrap(), "NTTT");
    }

    #[test]
    fn reverse_complement_rejects_unknown_bases() {
        assert!(matches!(
            reverse_complement("AGU"),
            Err(UtilError::UnknownBase('U'))
        ));
    }

    #[test]
    fn small_file_counts_use_a_single_level() {
        let dir = TempDir::new().unwrap();
        let layout = create_subdirectories(42, dir.path()).unwrap();
        assert_eq!(layout, "1");
        assert!(dir.path().join("0").is_dir());
    }

    #[test]
    fn large_file_counts_nest() {
        let dir = TempDir::new().unwrap();
        let layout = create_subdirectories(250, dir.path()).unwrap();
        assert_eq!(layout, "3");
        assert!(dir.path().join("2").is_dir());
    }

    #[test]
    fn output_subdirectories_locates_packets() {
        assert_eq!(output_subdirectories(7, "1").unwrap(), [PathBuf::from("0")]);
        assert!(output_subdirectories(7, "x").is_err());
    }

    #[test]
    fn zero_directory_counts_are_rejected() {
        // An empty run produces a zero-count layout; looking a packet up in
        // it must error rather than divide by zero.
        let dir = TempDir::new().unwrap();
        let layout = create_subdirectories(0, dir.path()).unwrap();
        assert_eq!(layout, "0");
        assert!(matches!(
            output_subdirectories(0, &layout),
            Err(UtilError::BadLayout { .. })
        ));
        assert!(matches!(
            output_subdirectories(3, "2,0"),
            Err(UtilError::BadLayout { .. })
        ));
    }
}
