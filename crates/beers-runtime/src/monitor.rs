//! Monitoring of pipeline jobs across scheduler queues.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use beers_core::constants::{DATA_DIRECTORY_NAME, LOG_DIRECTORY_NAME};
use beers_core::ports::{
    JobScheduler, PipelineStep, SchedulerError, SchedulerStatus, SubmitRequest, SystemJobId,
    ValidationAttributes,
};
use beers_core::sample::Sample;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::scheduler::{SchedulerDefaults, SchedulerRegistry};

/// Errors from job monitoring.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(
        "could not add job {job_id} to the scheduler because its associated pipeline \
         step ({step_name}) is not currently tracked by the job monitor"
    )]
    UnknownStep { job_id: String, step_name: String },

    #[error(
        "submitted job {0} is already in the list of running or pending jobs; to move \
         a job from the pending to the running list, use submit_pending_job"
    )]
    AlreadyTracked(String),

    #[error("job {0} is already in the list of running jobs or jobs marked for resubmission")]
    AlreadyActive(String),

    #[error("job {0} missing from the list of pending jobs")]
    NotPending(String),

    #[error("resubmitted job {0} is already in the list of running or pending jobs")]
    AlreadyQueued(String),

    #[error("resubmitted job {0} missing from the list of jobs marked for resubmission")]
    NotMarkedForResubmission(String),

    #[error("job {job_id} exceeded the maximum resubmission limit of {limit}")]
    ResubmissionLimitReached { job_id: String, limit: u32 },

    #[error("job submission failed for {step_name}: {source}")]
    SubmissionFailed {
        step_name: String,
        source: SchedulerError,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// A job's run status as the monitor sees it, combining the scheduler's view
/// with output validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Submitted to the system; might be running or waiting in its queue.
    Submitted,
    /// Finished with error status or incomplete output files.
    Failed,
    /// Finished successfully with complete output files.
    Completed,
    /// Not submitted yet; waiting for a dependency to complete.
    WaitingForDependency,
}

/// One monitored unit of work: a pipeline step invocation submitted (or to be
/// submitted) to a scheduler, together with everything needed to resubmit it.
#[derive(Debug, Clone)]
pub struct Job {
    /// Internal BEERS id that uniquely identifies this job.
    pub id: String,
    /// Submission request handed to the scheduler, including the command.
    pub request: SubmitRequest,
    /// Sample associated with the job, if any.
    pub sample_id: Option<String>,
    /// Pipeline step this job runs; must be tracked by the monitor.
    pub step_name: String,
    /// Attributes the step uses to validate this job's output.
    pub validation_attributes: ValidationAttributes,
    /// Directory where the job's output is stored.
    pub output_directory: PathBuf,
    /// Identifier assigned by the system scheduler once submitted.
    pub system_id: Option<SystemJobId>,
    /// Internal ids of jobs that must complete before this one runs.
    pub dependencies: HashSet<String>,
    /// Times the job has been resubmitted after failing.
    pub resubmission_counter: u32,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        request: SubmitRequest,
        step_name: impl Into<String>,
        validation_attributes: ValidationAttributes,
        output_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            request,
            sample_id: None,
            step_name: step_name.into(),
            validation_attributes,
            output_directory: output_directory.into(),
            system_id: None,
            dependencies: HashSet::new(),
            resubmission_counter: 0,
        }
    }

    #[must_use]
    pub fn with_system_id(mut self, system_id: SystemJobId) -> Self {
        self.system_id = Some(system_id);
        self
    }

    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependency_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_dependencies(dependency_ids);
        self
    }

    /// Add the given ids to the job's dependency list.
    pub fn add_dependencies<I, S>(&mut self, dependency_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependency_ids.into_iter().map(Into::into));
    }

    pub fn log_directory(&self) -> PathBuf {
        self.output_directory.join(LOG_DIRECTORY_NAME)
    }

    pub fn data_directory(&self) -> PathBuf {
        self.output_directory.join(DATA_DIRECTORY_NAME)
    }

    /// Determine the job's current run status from the system scheduler and
    /// the job's output files.
    ///
    /// A job the scheduler cannot account for is treated as failed and will
    /// be resubmitted; likewise one whose output fails the step's validation.
    pub async fn check_status(
        &self,
        step: &dyn PipelineStep,
        scheduler: &dyn JobScheduler,
    ) -> JobStatus {
        let Some(system_id) = &self.system_id else {
            return JobStatus::WaitingForDependency;
        };
        match scheduler.check_job_status(system_id, &[]).await {
            Ok(SchedulerStatus::Running | SchedulerStatus::Pending) => JobStatus::Submitted,
            Ok(SchedulerStatus::Failed) => JobStatus::Failed,
            Ok(SchedulerStatus::Completed) => {
                if step.is_output_valid(&self.validation_attributes) {
                    JobStatus::Completed
                } else {
                    JobStatus::Failed
                }
            }
            Err(error) => {
                warn!(job_id = %self.id, %system_id, %error, "could not retrieve job status");
                JobStatus::Failed
            }
        }
    }
}

/// Tracks the jobs running throughout a pipeline.
///
/// Jobs move between four queues: pending (dependencies unmet), running
/// (submitted to the scheduler), resubmission (failed and awaiting another
/// attempt), and completed.
pub struct JobMonitor {
    output_directory: PathBuf,
    scheduler_name: String,
    scheduler: Arc<dyn JobScheduler>,
    max_resub_limit: u32,
    pending_list: HashMap<String, Job>,
    running_list: HashMap<String, Job>,
    resubmission_list: HashMap<String, Job>,
    completed_list: HashMap<String, Job>,
    samples_by_id: HashMap<String, Sample>,
    pipeline_steps: HashMap<String, Arc<dyn PipelineStep>>,
}

impl JobMonitor {
    /// Create a monitor dispatching through the named scheduler mode.
    pub fn new(
        output_directory: impl Into<PathBuf>,
        scheduler_name: &str,
        registry: &SchedulerRegistry,
        defaults: SchedulerDefaults,
    ) -> Result<Self, MonitorError> {
        let scheduler = registry.create(scheduler_name, defaults)?;
        Ok(Self::with_scheduler(
            output_directory,
            scheduler_name,
            scheduler,
        ))
    }

    /// Create a monitor around an already-built scheduler backend.
    pub fn with_scheduler(
        output_directory: impl Into<PathBuf>,
        scheduler_name: &str,
        scheduler: Arc<dyn JobScheduler>,
    ) -> Self {
        Self {
            output_directory: output_directory.into(),
            scheduler_name: scheduler_name.to_string(),
            scheduler,
            max_resub_limit: 3,
            pending_list: HashMap::new(),
            running_list: HashMap::new(),
            resubmission_list: HashMap::new(),
            completed_list: HashMap::new(),
            samples_by_id: HashMap::new(),
            pipeline_steps: HashMap::new(),
        }
    }

    /// Set the number of times a job may be resubmitted before the pipeline
    /// halts. Defaults to 3.
    #[must_use]
    pub fn with_max_resubmissions(mut self, limit: u32) -> Self {
        self.max_resub_limit = limit;
        self
    }

    pub fn output_directory(&self) -> &PathBuf {
        &self.output_directory
    }

    pub fn log_directory(&self) -> PathBuf {
        self.output_directory.join(LOG_DIRECTORY_NAME)
    }

    /// Track a pipeline step so jobs can be validated against it.
    pub fn add_pipeline_step(&mut self, step: Arc<dyn PipelineStep>) {
        self.pipeline_steps.insert(step.name().to_string(), step);
    }

    pub fn has_pipeline_step(&self, step_name: &str) -> bool {
        self.pipeline_steps.contains_key(step_name)
    }

    pub fn get_pipeline_step(&self, step_name: &str) -> Option<&Arc<dyn PipelineStep>> {
        self.pipeline_steps.get(step_name)
    }

    pub fn get_sample(&self, sample_id: &str) -> Option<&Sample> {
        self.samples_by_id.get(sample_id)
    }

    /// Add a job to the monitor's queues.
    ///
    /// A job arriving with a system id goes straight to the running queue;
    /// anything else starts out pending. The onus is on the caller to leave
    /// the system id off jobs that should wait for their dependencies.
    pub fn submit_new_job(
        &mut self,
        mut job: Job,
        sample: Option<Sample>,
    ) -> Result<(), MonitorError> {
        if !self.has_pipeline_step(&job.step_name) {
            return Err(MonitorError::UnknownStep {
                job_id: job.id,
                step_name: job.step_name,
            });
        }
        if self.running_list.contains_key(&job.id) || self.pending_list.contains_key(&job.id) {
            debug!(
                running = ?self.running_list.keys().collect::<Vec<_>>(),
                pending = ?self.pending_list.keys().collect::<Vec<_>>(),
                "duplicate job submission"
            );
            return Err(MonitorError::AlreadyTracked(job.id));
        }

        if let Some(sample) = sample {
            job.sample_id = Some(sample.id.clone());
            self.samples_by_id.entry(sample.id.clone()).or_insert(sample);
        }

        let job_id = job.id.clone();
        if job.system_id.is_some() {
            self.running_list.insert(job_id, job);
        } else {
            self.pending_list.insert(job_id, job);
        }
        Ok(())
    }

    /// Submit a pending job through the scheduler and move it to the running
    /// queue.
    pub async fn submit_pending_job(&mut self, job_id: &str) -> Result<(), MonitorError> {
        // Checked before the pending list so a job sitting in the wrong queue
        // produces the error that names the actual problem.
        if self.running_list.contains_key(job_id) || self.resubmission_list.contains_key(job_id) {
            return Err(MonitorError::AlreadyActive(job_id.to_string()));
        }
        let Some(mut job) = self.pending_list.remove(job_id) else {
            return Err(MonitorError::NotPending(job_id.to_string()));
        };

        match self.dispatch(&job).await {
            Ok(system_id) => {
                job.system_id = Some(system_id);
                self.running_list.insert(job.id.clone(), job);
                Ok(())
            }
            Err(error) => {
                let step_name = job.step_name.clone();
                self.pending_list.insert(job.id.clone(), job);
                Err(MonitorError::SubmissionFailed {
                    step_name,
                    source: error,
                })
            }
        }
    }

    /// Resubmit a failed job through the scheduler and move it back to the
    /// running queue, counting the attempt.
    pub async fn resubmit_job(&mut self, job_id: &str) -> Result<(), MonitorError> {
        if self.running_list.contains_key(job_id) || self.pending_list.contains_key(job_id) {
            return Err(MonitorError::AlreadyQueued(job_id.to_string()));
        }
        let Some(mut job) = self.resubmission_list.remove(job_id) else {
            return Err(MonitorError::NotMarkedForResubmission(job_id.to_string()));
        };
        if job.resubmission_counter >= self.max_resub_limit {
            let limit = self.max_resub_limit;
            let job_id = job.id.clone();
            self.resubmission_list.insert(job_id.clone(), job);
            return Err(MonitorError::ResubmissionLimitReached { job_id, limit });
        }

        match self.dispatch(&job).await {
            Ok(system_id) => {
                job.system_id = Some(system_id);
                job.resubmission_counter += 1;
                self.running_list.insert(job.id.clone(), job);
                Ok(())
            }
            Err(error) => {
                let step_name = job.step_name.clone();
                self.resubmission_list.insert(job.id.clone(), job);
                Err(MonitorError::SubmissionFailed {
                    step_name,
                    source: error,
                })
            }
        }
    }

    async fn dispatch(&self, job: &Job) -> Result<SystemJobId, SchedulerError> {
        let sample_name = job
            .sample_id
            .as_deref()
            .and_then(|id| self.samples_by_id.get(id))
            .map(|sample| sample.name.clone());
        info!(
            step = %job.step_name,
            scheduler = %self.scheduler_name,
            sample = sample_name.as_deref().unwrap_or("none"),
            "submitting job"
        );
        self.scheduler.submit_job(&job.request).await
    }

    /// Whether all of a pending job's dependencies are in the completed
    /// queue. Jobs with no dependencies are always satisfied.
    pub fn are_dependencies_satisfied(&self, job_id: &str) -> bool {
        match self.pending_list.get(job_id) {
            Some(job) => job
                .dependencies
                .iter()
                .all(|dependency| self.completed_list.contains_key(dependency)),
            None => false,
        }
    }

    /// Move a job from the running queue to the completed queue.
    pub fn mark_job_completed(&mut self, job_id: &str) {
        if let Some(job) = self.running_list.remove(job_id) {
            self.completed_list.insert(job_id.to_string(), job);
        }
    }

    /// Move a job from the running queue to the resubmission queue.
    pub fn mark_job_for_resubmission(&mut self, job_id: &str) {
        if let Some(job) = self.running_list.remove(job_id) {
            self.resubmission_list.insert(job_id.to_string(), job);
        }
    }

    /// Check every running job's status, moving finished jobs to the
    /// completed or resubmission queues, and report whether all processing
    /// is done (pending, running, and resubmission queues all empty).
    pub async fn is_processing_complete(&mut self) -> bool {
        let running_ids: Vec<String> = self.running_list.keys().cloned().collect();
        for job_id in running_ids {
            let Some(job) = self.running_list.get(&job_id) else {
                continue;
            };
            let Some(step) = self.pipeline_steps.get(&job.step_name) else {
                continue;
            };
            let status = job.check_status(step.as_ref(), self.scheduler.as_ref()).await;
            match status {
                JobStatus::Failed => self.mark_job_for_resubmission(&job_id),
                JobStatus::Completed => self.mark_job_completed(&job_id),
                JobStatus::Submitted | JobStatus::WaitingForDependency => {}
            }
        }

        info!(
            running = self.running_list.len(),
            pending = self.pending_list.len(),
            resubmission = self.resubmission_list.len(),
            completed = self.completed_list.len(),
            "job queue status"
        );

        self.running_list.is_empty()
            && self.pending_list.is_empty()
            && self.resubmission_list.is_empty()
    }

    /// Monitor until every job in the pending, running, and resubmission
    /// queues has completed: resubmit failed jobs, submit pending jobs as
    /// their dependencies are satisfied, and sweep finished jobs into the
    /// completed queue.
    pub async fn monitor_until_all_jobs_completed(
        &mut self,
        queue_update_interval: Duration,
    ) -> Result<(), MonitorError> {
        while !self.is_processing_complete().await {
            let resubmission_ids: Vec<String> = self.resubmission_list.keys().cloned().collect();
            if !resubmission_ids.is_empty() {
                info!(count = resubmission_ids.len(), "resubmitting failed jobs");
                for job_id in resubmission_ids {
                    self.resubmit_job(&job_id).await?;
                }
            }

            let pending_ids: Vec<String> = self.pending_list.keys().cloned().collect();
            for job_id in pending_ids {
                if self.are_dependencies_satisfied(&job_id) {
                    self.submit_pending_job(&job_id).await?;
                }
            }
            tokio::time::sleep(queue_update_interval).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use beers_core::ports::StepError;
    use std::sync::Mutex;

    /// Scheduler stub whose status answers are keyed off the system job id.
    struct TestingScheduler {
        submissions: Mutex<Vec<String>>,
    }

    impl TestingScheduler {
        fn new() -> Self {
            Self {
                submissions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl JobScheduler for TestingScheduler {
        async fn submit_job(&self, request: &SubmitRequest) -> Result<SystemJobId, SchedulerError> {
            if request.additional_args.iter().any(|arg| arg == "ERROR") {
                return Err(SchedulerError::UnparsableOutput {
                    output: "submission rejected".to_string(),
                });
            }
            self.submissions.lock().unwrap().push(request.job_name.clone());
            Ok(SystemJobId("COMPLETED".to_string()))
        }

        async fn check_job_status(
            &self,
            job_id: &SystemJobId,
            _additional_args: &[String],
        ) -> Result<SchedulerStatus, SchedulerError> {
            match job_id.0.as_str() {
                "RUNNING" => Ok(SchedulerStatus::Running),
                "PENDING" => Ok(SchedulerStatus::Pending),
                "FAILED" => Ok(SchedulerStatus::Failed),
                "ERROR" => Err(SchedulerError::UnparsableOutput {
                    output: "no such job".to_string(),
                }),
                _ => Ok(SchedulerStatus::Completed),
            }
        }

        async fn kill_job(
            &self,
            _job_id: &SystemJobId,
            _additional_args: &[String],
        ) -> Result<(), SchedulerError> {
            Ok(())
        }
    }

    /// Step stub whose output validity is read back out of the job's
    /// validation attributes.
    struct TestingStep;

    #[async_trait]
    impl PipelineStep for TestingStep {
        fn name(&self) -> &str {
            "TestingStep"
        }

        fn validate(&self) -> bool {
            true
        }

        fn is_output_valid(&self, attributes: &ValidationAttributes) -> bool {
            attributes
                .get("Passes")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false)
        }

        async fn execute(&self) -> Result<(), StepError> {
            Ok(())
        }
    }

    fn passing_attributes(passes: bool) -> ValidationAttributes {
        let mut attributes = ValidationAttributes::new();
        attributes.insert("Passes".to_string(), serde_json::Value::Bool(passes));
        attributes
    }

    fn test_monitor() -> JobMonitor {
        let mut monitor = JobMonitor::with_scheduler(
            "./",
            "TestingScheduler",
            Arc::new(TestingScheduler::new()),
        );
        monitor.add_pipeline_step(Arc::new(TestingStep));
        monitor
    }

    fn test_job(id: &str, attributes: ValidationAttributes) -> Job {
        Job::new(
            id,
            SubmitRequest::new("", format!("job_{id}")),
            "TestingStep",
            attributes,
            "",
        )
    }

    #[tokio::test]
    async fn status_completed_when_scheduler_and_output_agree() {
        let monitor = test_monitor();
        let job = test_job("1", passing_attributes(true)).with_system_id("COMPLETED".into());
        let status = job
            .check_status(&TestingStep, monitor.scheduler.as_ref())
            .await;
        assert_eq!(status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn status_failed_when_output_is_invalid() {
        let monitor = test_monitor();
        let job = test_job("1", passing_attributes(false)).with_system_id("COMPLETED".into());
        let status = job
            .check_status(&TestingStep, monitor.scheduler.as_ref())
            .await;
        assert_eq!(status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn status_failed_when_scheduler_reports_failure() {
        let monitor = test_monitor();
        let job = test_job("1", passing_attributes(true)).with_system_id("FAILED".into());
        let status = job
            .check_status(&TestingStep, monitor.scheduler.as_ref())
            .await;
        assert_eq!(status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn status_failed_when_scheduler_cannot_account_for_the_job() {
        let monitor = test_monitor();
        let job = test_job("1", passing_attributes(true)).with_system_id("ERROR".into());
        let status = job
            .check_status(&TestingStep, monitor.scheduler.as_ref())
            .await;
        assert_eq!(status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn status_waiting_without_a_system_id() {
        let monitor = test_monitor();
        let job = test_job("1", ValidationAttributes::new());
        let status = job
            .check_status(&TestingStep, monitor.scheduler.as_ref())
            .await;
        assert_eq!(status, JobStatus::WaitingForDependency);
    }

    #[tokio::test]
    async fn status_submitted_while_running_or_pending() {
        let monitor = test_monitor();
        for system_id in ["RUNNING", "PENDING"] {
            let job = test_job("1", ValidationAttributes::new()).with_system_id(system_id.into());
            let status = job
                .check_status(&TestingStep, monitor.scheduler.as_ref())
                .await;
            assert_eq!(status, JobStatus::Submitted);
        }
    }

    #[test]
    fn new_jobs_without_system_ids_start_pending() {
        let mut monitor = test_monitor();
        let sample = Sample::new("1", "sample1");
        monitor
            .submit_new_job(test_job("1", ValidationAttributes::new()), Some(sample))
            .unwrap();
        assert!(monitor.pending_list.contains_key("1"));
        assert_eq!(
            monitor.pending_list["1"].sample_id.as_deref(),
            Some("1")
        );
        assert!(monitor.get_sample("1").is_some());
    }

    #[test]
    fn new_jobs_with_system_ids_start_running() {
        let mut monitor = test_monitor();
        let job = test_job("1", ValidationAttributes::new()).with_system_id("RUNNING".into());
        monitor.submit_new_job(job, None).unwrap();
        assert!(monitor.running_list.contains_key("1"));
    }

    #[test]
    fn new_jobs_require_a_tracked_step() {
        let mut monitor = test_monitor();
        let mut job = test_job("1", ValidationAttributes::new());
        job.step_name = "NotTestingStep".to_string();
        assert!(matches!(
            monitor.submit_new_job(job, None),
            Err(MonitorError::UnknownStep { .. })
        ));
    }

    #[test]
    fn duplicate_jobs_are_rejected() {
        let mut monitor = test_monitor();
        monitor
            .submit_new_job(test_job("1", ValidationAttributes::new()), None)
            .unwrap();
        assert!(matches!(
            monitor.submit_new_job(test_job("1", ValidationAttributes::new()), None),
            Err(MonitorError::AlreadyTracked(_))
        ));
    }

    #[tokio::test]
    async fn pending_jobs_move_to_running_on_submission() {
        let mut monitor = test_monitor();
        monitor
            .submit_new_job(test_job("1", ValidationAttributes::new()), None)
            .unwrap();
        monitor.submit_pending_job("1").await.unwrap();
        assert!(monitor.running_list.contains_key("1"));
        assert!(!monitor.pending_list.contains_key("1"));
        assert_eq!(
            monitor.running_list["1"].system_id,
            Some(SystemJobId("COMPLETED".to_string()))
        );
    }

    #[tokio::test]
    async fn submitting_a_job_that_is_not_pending_fails() {
        let mut monitor = test_monitor();
        assert!(matches!(
            monitor.submit_pending_job("1").await,
            Err(MonitorError::NotPending(_))
        ));

        let job = test_job("2", ValidationAttributes::new()).with_system_id("RUNNING".into());
        monitor.submit_new_job(job, None).unwrap();
        assert!(matches!(
            monitor.submit_pending_job("2").await,
            Err(MonitorError::AlreadyActive(_))
        ));
    }

    #[tokio::test]
    async fn failed_submission_surfaces_and_keeps_the_job_pending() {
        let mut monitor = test_monitor();
        let mut job = test_job("1", ValidationAttributes::new());
        job.request = job.request.with_additional_args(vec!["ERROR".to_string()]);
        monitor.submit_new_job(job, None).unwrap();
        assert!(matches!(
            monitor.submit_pending_job("1").await,
            Err(MonitorError::SubmissionFailed { .. })
        ));
        assert!(monitor.pending_list.contains_key("1"));
    }

    #[tokio::test]
    async fn resubmission_counts_attempts() {
        let mut monitor = test_monitor();
        let job = test_job("1", ValidationAttributes::new());
        monitor.resubmission_list.insert("1".to_string(), job);
        monitor.resubmit_job("1").await.unwrap();
        assert_eq!(monitor.running_list["1"].resubmission_counter, 1);
        assert!(!monitor.resubmission_list.contains_key("1"));
    }

    #[tokio::test]
    async fn resubmission_limit_halts_the_pipeline() {
        let mut monitor = test_monitor();
        let mut job = test_job("1", ValidationAttributes::new());
        job.resubmission_counter = 3;
        monitor.resubmission_list.insert("1".to_string(), job);
        assert!(matches!(
            monitor.resubmit_job("1").await,
            Err(MonitorError::ResubmissionLimitReached { limit: 3, .. })
        ));
    }

    #[tokio::test]
    async fn resubmitting_a_job_in_the_wrong_queue_fails() {
        let mut monitor = test_monitor();
        assert!(matches!(
            monitor.resubmit_job("1").await,
            Err(MonitorError::NotMarkedForResubmission(_))
        ));

        monitor
            .submit_new_job(test_job("2", ValidationAttributes::new()), None)
            .unwrap();
        assert!(matches!(
            monitor.resubmit_job("2").await,
            Err(MonitorError::AlreadyQueued(_))
        ));
    }

    #[tokio::test]
    async fn processing_is_complete_with_empty_active_queues() {
        let mut monitor = test_monitor();
        assert!(monitor.is_processing_complete().await);

        monitor
            .completed_list
            .insert("1".to_string(), test_job("1", ValidationAttributes::new()));
        assert!(monitor.is_processing_complete().await);
    }

    #[tokio::test]
    async fn completed_jobs_are_swept_out_of_the_running_queue() {
        let mut monitor = test_monitor();
        let job = test_job("1", passing_attributes(true)).with_system_id("COMPLETED".into());
        monitor.running_list.insert("1".to_string(), job);
        assert!(monitor.is_processing_complete().await);
        assert!(monitor.completed_list.contains_key("1"));
        assert!(!monitor.running_list.contains_key("1"));
    }

    #[tokio::test]
    async fn failed_jobs_are_marked_for_resubmission() {
        let mut monitor = test_monitor();
        let job = test_job("1", passing_attributes(true)).with_system_id("FAILED".into());
        monitor.running_list.insert("1".to_string(), job);
        assert!(!monitor.is_processing_complete().await);
        assert!(monitor.resubmission_list.contains_key("1"));
        assert!(!monitor.running_list.contains_key("1"));
    }

    #[tokio::test]
    async fn running_jobs_stay_in_the_running_queue() {
        let mut monitor = test_monitor();
        let job = test_job("1", ValidationAttributes::new()).with_system_id("RUNNING".into());
        monitor.running_list.insert("1".to_string(), job);
        assert!(!monitor.is_processing_complete().await);
        assert!(monitor.running_list.contains_key("1"));
    }

    #[tokio::test]
    async fn pending_or_resubmission_jobs_keep_processing_incomplete() {
        let mut monitor = test_monitor();
        monitor
            .pending_list
            .insert("1".to_string(), test_job("1", ValidationAttributes::new()));
        assert!(!monitor.is_processing_complete().await);

        let mut monitor = test_monitor();
        monitor
            .resubmission_list
            .insert("1".to_string(), test_job("1", ValidationAttributes::new()));
        assert!(!monitor.is_processing_complete().await);
    }

    #[tokio::test]
    async fn dependencies_must_all_complete() {
        let mut monitor = test_monitor();
        let job = test_job("1", ValidationAttributes::new())
            .with_dependencies(["Dependency_1", "Dependency_2"]);
        monitor.pending_list.insert("1".to_string(), job);

        monitor.completed_list.insert(
            "Dependency_1".to_string(),
            test_job("Dependency_1", ValidationAttributes::new()),
        );
        assert!(!monitor.are_dependencies_satisfied("1"));

        monitor.completed_list.insert(
            "Dependency_2".to_string(),
            test_job("Dependency_2", ValidationAttributes::new()),
        );
        assert!(monitor.are_dependencies_satisfied("1"));
    }

    #[tokio::test]
    async fn no_dependencies_are_always_satisfied() {
        let mut monitor = test_monitor();
        monitor
            .pending_list
            .insert("1".to_string(), test_job("1", ValidationAttributes::new()));
        assert!(monitor.are_dependencies_satisfied("1"));
    }

    #[tokio::test]
    async fn monitoring_runs_a_dependency_chain_to_completion() {
        let mut monitor = test_monitor();
        monitor
            .submit_new_job(test_job("first", passing_attributes(true)), None)
            .unwrap();
        let second =
            test_job("second", passing_attributes(true)).with_dependencies(["first"]);
        monitor.submit_new_job(second, None).unwrap();

        monitor
            .monitor_until_all_jobs_completed(Duration::from_millis(1))
            .await
            .unwrap();
        assert!(monitor.completed_list.contains_key("first"));
        assert!(monitor.completed_list.contains_key("second"));
        assert!(monitor.pending_list.is_empty());
    }
}
