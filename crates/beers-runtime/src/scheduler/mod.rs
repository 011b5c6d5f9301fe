//! Scheduler backends implementing the [`beers_core::ports::JobScheduler`]
//! port.

mod lsf;
mod registry;
mod serial;
mod sge;

pub use lsf::LsfJobScheduler;
pub use registry::{SchedulerDefaults, SchedulerRegistry};
pub use serial::SerialJobScheduler;
pub use sge::SgeJobScheduler;
