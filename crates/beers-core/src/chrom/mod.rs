//! Chromosome name ordering and coordinate-based sorting.

mod name;
mod roman;
mod sort;

pub use name::ChromosomeName;
pub use roman::roman_to_arabic;
pub use sort::{
    sort_file_by_coordinates, sort_names, ChromosomeCoordinate, CoordinateSortOptions, SortError,
};
