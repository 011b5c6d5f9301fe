//! Factory registry mapping scheduler modes to backends.

use std::collections::HashMap;
use std::sync::Arc;

use beers_core::ports::{JobScheduler, SchedulerError};

use super::{LsfJobScheduler, SerialJobScheduler, SgeJobScheduler};

/// Default resource requests applied when a submission does not specify its
/// own.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerDefaults {
    /// Processors/cores to request per job.
    pub num_processors: u32,
    /// Memory (in Mb) to request per job.
    pub memory_in_mb: u64,
}

impl Default for SchedulerDefaults {
    fn default() -> Self {
        Self {
            num_processors: 1,
            memory_in_mb: 6000,
        }
    }
}

type SchedulerFactory = Box<dyn Fn(SchedulerDefaults) -> Arc<dyn JobScheduler> + Send + Sync>;

/// Registry providing the correct scheduler backend for a scheduler mode.
///
/// Keeping the mode-to-backend mapping here separates scheduler specifics
/// from the rest of the code base; additional schedulers only need a
/// [`SchedulerRegistry::register`] call.
pub struct SchedulerRegistry {
    factories: HashMap<String, SchedulerFactory>,
}

impl SchedulerRegistry {
    /// An empty registry with no modes.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with the built-in serial, lsf, and sge modes.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("serial", |_| Arc::new(SerialJobScheduler::new()));
        registry.register("lsf", |defaults| Arc::new(LsfJobScheduler::new(defaults)));
        registry.register("sge", |defaults| Arc::new(SgeJobScheduler::new(defaults)));
        registry
    }

    /// Make a scheduler mode available under the given name.
    pub fn register<F>(&mut self, mode: impl Into<String>, factory: F)
    where
        F: Fn(SchedulerDefaults) -> Arc<dyn JobScheduler> + Send + Sync + 'static,
    {
        self.factories.insert(mode.into(), Box::new(factory));
    }

    /// The scheduler modes currently registered, sorted by name.
    pub fn supported_modes(&self) -> Vec<String> {
        let mut modes: Vec<String> = self.factories.keys().cloned().collect();
        modes.sort();
        modes
    }

    /// Build the scheduler backend for a mode.
    pub fn create(
        &self,
        mode: &str,
        defaults: SchedulerDefaults,
    ) -> Result<Arc<dyn JobScheduler>, SchedulerError> {
        self.factories
            .get(mode)
            .map(|factory| factory(defaults))
            .ok_or_else(|| SchedulerError::UnsupportedMode(mode.to_string()))
    }
}

impl Default for SchedulerRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
