//! CLI entry point for the BEERS utilities.

mod commands;

use std::fs::File;
use std::io::{BufRead, BufReader};

use clap::Parser;
use tracing::info;

use beers_core::chrom::{CoordinateSortOptions, sort_file_by_coordinates, sort_names};
use beers_core::coverage::Coverage;

use commands::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::SortNames { input } => {
            let reader = BufReader::new(File::open(&input)?);
            let names: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
            for name in sort_names(names) {
                println!("{name}");
            }
        }
        Commands::SortFile {
            input,
            chrom_column,
            start_column,
            end_column,
            no_header,
            output,
        } => {
            let mut options = CoordinateSortOptions::new(chrom_column).with_header(!no_header);
            if let Some(column) = start_column {
                options = options.with_start_column(column);
            }
            if let Some(column) = end_column {
                options = options.with_end_column(column);
            }
            if let Some(path) = output {
                options = options.with_sorted_path(path);
            }
            let sorted_path = sort_file_by_coordinates(&input, &options)?;
            info!(sorted = %sorted_path.display(), "wrote sorted file");
        }
        Commands::Coverage {
            molecule_file,
            output_prefix,
            max_chromosome_size,
        } => {
            let mut coverage = match max_chromosome_size {
                Some(megabases) => Coverage::with_chromosome_size_hint(megabases * 1_000_000),
                None => Coverage::new(),
            };
            coverage.add_camparee_file(&molecule_file)?;
            let (forward_path, reverse_path) = coverage.write_bedgraph(&output_prefix)?;
            info!(
                forward = %forward_path.display(),
                reverse = %reverse_path.display(),
                "wrote coverage files"
            );
        }
    }
    Ok(())
}
