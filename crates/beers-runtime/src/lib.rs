//! Job dispatch runtime for the BEERS suite.
//!
//! Implements the scheduler port from `beers-core` for serial in-process
//! execution and for the LSF and SGE cluster schedulers, plus the job
//! monitor that shepherds pipeline jobs through their queues.

#![deny(unused_crate_dependencies)]

pub mod monitor;
pub mod scheduler;
mod shell;

pub use monitor::{Job, JobMonitor, JobStatus, MonitorError};
pub use scheduler::{
    LsfJobScheduler, SchedulerDefaults, SchedulerRegistry, SerialJobScheduler, SgeJobScheduler,
};

#[cfg(test)]
use tokio_test as _;
