//! Pipeline step trait definition.

use async_trait::async_trait;
use thiserror::Error;

/// Attributes a step carries for validation, keyed by name.
pub type ValidationAttributes = serde_json::Map<String, serde_json::Value>;

/// Errors raised while executing a pipeline step.
#[derive(Debug, Error)]
pub enum StepError {
    /// The step's parameters are missing or out of range.
    #[error("step {step}: invalid parameters: {detail}")]
    InvalidParameters { step: String, detail: String },

    /// The step ran but could not finish its work.
    #[error("step {step} failed: {detail}")]
    Failed { step: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The minimal surface required of a step in any pipeline of the BEERS suite.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// The step's name, used in job names and log messages.
    fn name(&self) -> &str;

    /// Check validity of the parameters used to configure the step.
    ///
    /// Returns true when all parameters required to run this step were
    /// provided and are within valid ranges.
    fn validate(&self) -> bool;

    /// Check the integrity of a finished job's output.
    ///
    /// The attributes come from the job that ran the step and describe where
    /// its output should be found and what it should contain.
    fn is_output_valid(&self, attributes: &ValidationAttributes) -> bool;

    /// Entry point into the pipeline step.
    async fn execute(&self) -> Result<(), StepError>;
}
