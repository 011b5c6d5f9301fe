//! Sorting helpers built on [`ChromosomeName`] ordering.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::name::ChromosomeName;

/// Errors from coordinate-based file sorting.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("line {line} has no column {column}")]
    MissingColumn { line: usize, column: usize },

    #[error("line {line}: coordinate {value:?} is not a number")]
    BadCoordinate { line: usize, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A chromosome span, ordered by name, then start, then end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeCoordinate {
    pub name: ChromosomeName,
    pub start: u64,
    pub end: u64,
}

impl ChromosomeCoordinate {
    pub fn new(name: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            name: ChromosomeName::new(name),
            start,
            end,
        }
    }

    fn key(&self) -> String {
        format!("{}\t{}\t{}", self.name.original().to_lowercase(), self.start, self.end)
    }
}

impl PartialOrd for ChromosomeCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChromosomeCoordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.start.cmp(&other.start))
            .then_with(|| self.end.cmp(&other.end))
    }
}

/// Sort a listing of chromosome names, returning them as originally written.
pub fn sort_names<I, S>(listing: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut names: Vec<ChromosomeName> = listing
        .into_iter()
        .map(|item| ChromosomeName::new(item))
        .collect();
    names.sort();
    names
        .into_iter()
        .map(|name| name.original().to_string())
        .collect()
}

/// Options for [`sort_file_by_coordinates`]. Column numbers are 1-based.
#[derive(Debug, Clone)]
pub struct CoordinateSortOptions {
    chrom_column: usize,
    start_column: Option<usize>,
    end_column: Option<usize>,
    header: bool,
    sorted_path: Option<PathBuf>,
}

impl CoordinateSortOptions {
    pub fn new(chrom_column: usize) -> Self {
        Self {
            chrom_column,
            start_column: None,
            end_column: None,
            header: true,
            sorted_path: None,
        }
    }

    #[must_use]
    pub fn with_start_column(mut self, column: usize) -> Self {
        self.start_column = Some(column);
        self
    }

    #[must_use]
    pub fn with_end_column(mut self, column: usize) -> Self {
        self.end_column = Some(column);
        self
    }

    /// Treat the first line as a header, copying it through unsorted.
    /// Defaults to true.
    #[must_use]
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Where to write the sorted file. Defaults to the input filename with
    /// ".sorted" inserted before the extension.
    #[must_use]
    pub fn with_sorted_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sorted_path = Some(path.into());
        self
    }

    fn destination(&self, input: &Path) -> PathBuf {
        self.sorted_path.clone().unwrap_or_else(|| {
            let stem = input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let sorted_name = match input.extension() {
                Some(extension) => format!("{stem}.sorted.{}", extension.to_string_lossy()),
                None => format!("{stem}.sorted"),
            };
            input.with_file_name(sorted_name)
        })
    }
}

fn column<'a>(fields: &'a [&str], number: usize, line: usize) -> Result<&'a str, SortError> {
    fields
        .get(number - 1)
        .copied()
        .ok_or(SortError::MissingColumn {
            line,
            column: number,
        })
}

fn coordinate(value: &str, line: usize) -> Result<u64, SortError> {
    value.trim().parse().map_err(|_| SortError::BadCoordinate {
        line,
        value: value.to_string(),
    })
}

/// Sort a tab-delimited file by chromosomal coordinates.
///
/// Lines sharing identical coordinates stay together in input order. Missing
/// start or end columns are treated as coordinate 0. Overwrites any existing
/// file at the destination and returns its path.
pub fn sort_file_by_coordinates(
    input_path: &Path,
    options: &CoordinateSortOptions,
) -> Result<PathBuf, SortError> {
    let sorted_path = options.destination(input_path);
    let reader = BufReader::new(std::fs::File::open(input_path)?);
    let mut writer = BufWriter::new(std::fs::File::create(&sorted_path)?);

    let mut coordinates: Vec<ChromosomeCoordinate> = Vec::new();
    let mut entries: HashMap<String, String> = HashMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index == 0 && options.header {
            writeln!(writer, "{line}")?;
            continue;
        }
        let line_number = index + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        let chrom = column(&fields, options.chrom_column, line_number)?;
        let start = match options.start_column {
            Some(number) => coordinate(column(&fields, number, line_number)?, line_number)?,
            None => 0,
        };
        let end = match options.end_column {
            Some(number) => coordinate(column(&fields, number, line_number)?, line_number)?,
            None => 0,
        };
        let current = ChromosomeCoordinate::new(chrom, start, end);
        match entries.get_mut(&current.key()) {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(&line);
            }
            None => {
                entries.insert(current.key(), line);
                coordinates.push(current);
            }
        }
    }

    coordinates.sort();
    debug!(
        input = %input_path.display(),
        sorted = %sorted_path.display(),
        spans = coordinates.len(),
        "sorted file by chromosome coordinates"
    );
    for coord in &coordinates {
        writeln!(writer, "{}", entries[&coord.key()])?;
    }
    writer.flush()?;
    Ok(sorted_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn name_listings_sort() {
        let sorted = sort_names(["chr10", "chr2", "chrM", "chr1", "chrX"]);
        assert_eq!(sorted, ["chr1", "chr2", "chr10", "chrX", "chrM"]);
    }

    #[test]
    fn coordinates_order_by_name_then_span() {
        let mut spans = vec![
            ChromosomeCoordinate::new("chr2", 10, 20),
            ChromosomeCoordinate::new("chr1", 50, 60),
            ChromosomeCoordinate::new("chr1", 50, 55),
            ChromosomeCoordinate::new("chr1", 5, 6),
        ];
        spans.sort();
        assert_eq!(spans[0], ChromosomeCoordinate::new("chr1", 5, 6));
        assert_eq!(spans[1], ChromosomeCoordinate::new("chr1", 50, 55));
        assert_eq!(spans[2], ChromosomeCoordinate::new("chr1", 50, 60));
        assert_eq!(spans[3], ChromosomeCoordinate::new("chr2", 10, 20));
    }

    #[test]
    fn files_sort_with_header_preserved() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("features.txt");
        std::fs::write(
            &input,
            "chrom\tstart\tend\tfeature\n\
             chr10\t5\t10\tb\n\
             chr2\t1\t2\ta\n\
             chr2\t1\t2\ta2\n\
             chr1\t100\t200\tc\n",
        )
        .unwrap();

        let options = CoordinateSortOptions::new(1)
            .with_start_column(2)
            .with_end_column(3);
        let sorted_path = sort_file_by_coordinates(&input, &options).unwrap();
        assert_eq!(sorted_path, dir.path().join("features.sorted.txt"));
        let sorted = std::fs::read_to_string(&sorted_path).unwrap();
        assert_eq!(
            sorted,
            "chrom\tstart\tend\tfeature\n\
             chr1\t100\t200\tc\n\
             chr2\t1\t2\ta\n\
             chr2\t1\t2\ta2\n\
             chr10\t5\t10\tb\n"
        );
    }

    #[test]
    fn missing_columns_are_reported() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("short.txt");
        std::fs::write(&input, "chr1\n").unwrap();
        let options = CoordinateSortOptions::new(1).with_start_column(2).with_header(false);
        assert!(matches!(
            sort_file_by_coordinates(&input, &options),
            Err(SortError::MissingColumn { line: 1, column: 2 })
        ));
    }
}
