//! Job scheduler trait definition.
//!
//! This port wraps a system's job scheduler (e.g. SGE, LSF). It defines the
//! minimal set of methods the BEERS suite requires to submit, monitor, and
//! kill jobs; implementations handle all dispatch details internally.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from interacting with a system job scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler command itself could not be run.
    #[error("could not invoke scheduler command {command:?}: {source}")]
    Invocation {
        command: String,
        source: std::io::Error,
    },

    /// The scheduler command ran but reported failure.
    #[error("scheduler command {command:?} exited with {exit}: {stderr}")]
    CommandFailed {
        command: String,
        exit: String,
        stderr: String,
    },

    /// The scheduler's output did not contain what we needed.
    #[error("could not parse scheduler output {output:?}")]
    UnparsableOutput { output: String },

    /// No scheduler is registered under the requested mode name.
    #[error("unsupported scheduler mode {0:?}")]
    UnsupportedMode(String),
}

/// Identifier a system scheduler assigns to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SystemJobId(pub String);

impl fmt::Display for SystemJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SystemJobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A job's run status as reported by the system scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchedulerStatus {
    /// The job is actively running.
    Running,
    /// The job is waiting in the scheduler's queue.
    Pending,
    /// The job finished without error status.
    Completed,
    /// The job finished with error status.
    Failed,
}

impl fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SchedulerStatus::Running => "RUNNING",
            SchedulerStatus::Pending => "PENDING",
            SchedulerStatus::Completed => "COMPLETED",
            SchedulerStatus::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// A request to run one command under a scheduler.
///
/// This is intent-based configuration: it says what should run and what
/// resources it needs, not how any particular scheduler should be driven.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Full command line to execute.
    pub command: String,
    /// Name assigned to the job in the scheduler.
    pub job_name: String,
    /// Where the job's stdout should be stored.
    pub stdout_logfile: Option<PathBuf>,
    /// Where the job's stderr should be stored.
    pub stderr_logfile: Option<PathBuf>,
    /// Processors to request (scheduler default when None).
    pub num_processors: Option<u32>,
    /// Memory in Mb to request (scheduler default when None).
    pub memory_in_mb: Option<u64>,
    /// Additional arguments for the submission command.
    pub additional_args: Vec<String>,
}

impl SubmitRequest {
    pub fn new(command: impl Into<String>, job_name: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            job_name: job_name.into(),
            stdout_logfile: None,
            stderr_logfile: None,
            num_processors: None,
            memory_in_mb: None,
            additional_args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_stdout_logfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_logfile = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_stderr_logfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr_logfile = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_num_processors(mut self, num_processors: u32) -> Self {
        self.num_processors = Some(num_processors);
        self
    }

    #[must_use]
    pub const fn with_memory_in_mb(mut self, memory_in_mb: u64) -> Self {
        self.memory_in_mb = Some(memory_in_mb);
        self
    }

    #[must_use]
    pub fn with_additional_args(mut self, args: Vec<String>) -> Self {
        self.additional_args = args;
        self
    }
}

/// Job scheduler for dispatching pipeline step jobs.
///
/// Implementations exist for serial in-process execution and for the LSF and
/// SGE cluster schedulers; the monitor only ever talks to this trait.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Submit a job for execution.
    ///
    /// Returns the identifier the system scheduler assigned to the job.
    async fn submit_job(&self, request: &SubmitRequest) -> Result<SystemJobId, SchedulerError>;

    /// Determine a job's current run status.
    async fn check_job_status(
        &self,
        job_id: &SystemJobId,
        additional_args: &[String],
    ) -> Result<SchedulerStatus, SchedulerError>;

    /// Kill a submitted job.
    async fn kill_job(
        &self,
        job_id: &SystemJobId,
        additional_args: &[String],
    ) -> Result<(), SchedulerError>;
}
