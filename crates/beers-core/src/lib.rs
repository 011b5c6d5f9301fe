//! Core domain types and algorithms shared across the BEERS suite.
//!
//! This crate holds everything a simulator step needs that does not touch a
//! process or a cluster: molecules and their alignments, molecule packets,
//! samples, CIGAR arithmetic, chromosome ordering, coverage tracks, and the
//! port traits (pipeline steps and job schedulers) that the runtime crate
//! implements.

#![deny(unused_crate_dependencies)]

pub mod chrom;
pub mod cigar;
pub mod constants;
pub mod coverage;
pub mod fasta;
pub mod molecule;
pub mod packet;
pub mod ports;
pub mod sample;
pub mod util;

// Re-export commonly used types for convenience
pub use chrom::{
    ChromosomeCoordinate, ChromosomeName, CoordinateSortOptions, SortError,
    sort_file_by_coordinates, sort_names,
};
pub use cigar::{CigarError, CigarOp, Strand};
pub use coverage::{Coverage, CoverageError};
pub use fasta::{FastaError, FastaRecord, read_fasta};
pub use molecule::{Molecule, MoleculeError};
pub use packet::{MoleculePacket, PacketError};
pub use ports::{
    JobScheduler, PipelineStep, SchedulerError, SchedulerStatus, StepError, SubmitRequest,
    SystemJobId, ValidationAttributes,
};
pub use sample::{Gender, Sample, SampleError};
pub use util::{UtilError, create_subdirectories, generate_seed, output_subdirectories,
    reverse_complement};
