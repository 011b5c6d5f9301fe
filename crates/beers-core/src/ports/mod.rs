//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.

pub mod pipeline_step;
pub mod scheduler;

pub use pipeline_step::{PipelineStep, StepError, ValidationAttributes};
pub use scheduler::{
    JobScheduler, SchedulerError, SchedulerStatus, SubmitRequest, SystemJobId,
};
