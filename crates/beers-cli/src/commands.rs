//! Argument definitions for the `beers-utils` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line interface for the BEERS utilities.
#[derive(Parser)]
#[command(name = "beers-utils")]
#[command(about = "Shared utilities for the BEERS simulation suite")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sort a file of chromosome names, one per line, and print the result
    SortNames {
        /// File listing chromosome names
        #[arg(long)]
        input: PathBuf,
    },

    /// Sort a tab-delimited file by chromosomal coordinates
    SortFile {
        /// Tab-delimited input file
        input: PathBuf,

        /// 1-based column holding the chromosome name
        #[arg(long)]
        chrom_column: usize,

        /// 1-based column holding the start coordinate
        #[arg(long)]
        start_column: Option<usize>,

        /// 1-based column holding the end coordinate
        #[arg(long)]
        end_column: Option<usize>,

        /// Sort the first line too instead of copying it through as a header
        #[arg(long)]
        no_header: bool,

        /// Where to write the sorted file (defaults to <input>.sorted.<ext>)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Build bedGraph coverage files from a CAMPAREE molecule file
    Coverage {
        /// CAMPAREE molecule file
        molecule_file: PathBuf,

        /// Prefix for the .forward.cov and .reverse.cov output files
        output_prefix: PathBuf,

        /// Preallocate each chromosome's depth track to this many megabases
        #[arg(long)]
        max_chromosome_size: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sort_file_args_parse() {
        let cli = Cli::parse_from([
            "beers-utils",
            "sort-file",
            "genes.txt",
            "--chrom-column",
            "1",
            "--start-column",
            "2",
            "--no-header",
        ]);
        match cli.command {
            Commands::SortFile {
                input,
                chrom_column,
                start_column,
                end_column,
                no_header,
                output,
            } => {
                assert_eq!(input, PathBuf::from("genes.txt"));
                assert_eq!(chrom_column, 1);
                assert_eq!(start_column, Some(2));
                assert_eq!(end_column, None);
                assert!(no_header);
                assert!(output.is_none());
            }
            _ => panic!("parsed into the wrong subcommand"),
        }
    }

    #[test]
    fn coverage_args_parse() {
        let cli = Cli::parse_from([
            "beers-utils",
            "coverage",
            "molecule_file1.txt",
            "out/sample1",
            "--max-chromosome-size",
            "250",
        ]);
        match cli.command {
            Commands::Coverage {
                molecule_file,
                output_prefix,
                max_chromosome_size,
            } => {
                assert_eq!(molecule_file, PathBuf::from("molecule_file1.txt"));
                assert_eq!(output_prefix, PathBuf::from("out/sample1"));
                assert_eq!(max_chromosome_size, Some(250));
            }
            _ => panic!("parsed into the wrong subcommand"),
        }
    }
}
