//! Well-known names and limits shared across the BEERS suite.
//!
//! Step-specific constants are deliberately excluded: those are owned by the
//! individual pipeline steps and subject to change by the user.

/// Name of the directory holding pipeline data output.
pub const DATA_DIRECTORY_NAME: &str = "data";

/// Name of the directory holding pipeline log output.
pub const LOG_DIRECTORY_NAME: &str = "logs";

/// Subdirectory of the log directory holding captured stdout.
pub const STDOUT_SUBDIRECTORY_NAME: &str = "stdout";

/// Subdirectory of the log directory holding captured stderr.
pub const STDERR_SUBDIRECTORY_NAME: &str = "stderr";

/// Name of the audit file written at the root of a run's output directory.
pub const AUDIT_FILENAME: &str = "audit.txt";

/// Cap on the number of files placed in any single output subdirectory.
pub const FILES_PER_DIRECTORY_LIMIT: u64 = 100;

/// Read direction convention used throughout the suite (forward, reverse).
pub const DIRECTION_CONVENTION: [u8; 2] = [1, 2];

/// Maximum value for a per-job seed derived from the controller's seed.
pub const MAX_SEED: u64 = 2_000_000_000;
