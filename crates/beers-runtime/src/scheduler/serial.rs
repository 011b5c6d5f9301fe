//! Serial execution of jobs on the local machine.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use beers_core::ports::{
    JobScheduler, SchedulerError, SchedulerStatus, SubmitRequest, SystemJobId,
};
use chrono::Utc;
use tracing::info;

use crate::shell::{ShellOutput, run_shell};

const TIME_FORMAT: &str = "%a %b %d %Y %H:%M:%S %Z";

/// Runs jobs serially on the local machine, one at a time.
///
/// The job is executed and completed entirely within [`JobScheduler::submit_job`],
/// so the kill and status-check methods are placeholders kept for
/// compatibility with the scheduler interface: status checks always report
/// completion, and kills always succeed. Final verification of a step's
/// output is left to the step's own validation.
#[derive(Debug, Default)]
pub struct SerialJobScheduler {
    // Counts the jobs that have attempted execution; the count is the job id.
    serial_job_id: AtomicU64,
}

impl SerialJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_job_id(&self) -> u64 {
        self.serial_job_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn write_logs(
        request: &SubmitRequest,
        job_id: u64,
        start: &str,
        end: &str,
        output: &ShellOutput,
    ) -> std::io::Result<()> {
        if let Some(stdout_logfile) = &request.stdout_logfile {
            let mut log = std::fs::File::create(stdout_logfile)?;
            writeln!(log, "Job submission ID: {job_id}")?;
            writeln!(log, "Job command: {}", request.command)?;
            writeln!(log, "Job start time: {start}")?;
            writeln!(log, "Job end time: {end}")?;
            if output.success {
                writeln!(log, "\nSuccessfully completed.")?;
            } else {
                writeln!(log, "\nFAILURE - {}.", output.exit)?;
            }
            if let Some(stderr_logfile) = &request.stderr_logfile {
                writeln!(log, "\nFor stderr see {}", stderr_logfile.display())?;
            }
            writeln!(log, "Output (if any) follows:")?;
            writeln!(log, "\n------------STDOUT------------")?;
            log.write_all(output.stdout.as_bytes())?;
            if request.stderr_logfile.is_none() {
                writeln!(log, "\n------------STDERR------------")?;
                log.write_all(output.stderr.as_bytes())?;
            }
        }
        if let Some(stderr_logfile) = &request.stderr_logfile {
            std::fs::write(stderr_logfile, &output.stderr)?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobScheduler for SerialJobScheduler {
    /// Run the job to completion on the local machine.
    ///
    /// The command should not contain any unix output redirection; the log
    /// files capture the command's output along with start and end times.
    async fn submit_job(&self, request: &SubmitRequest) -> Result<SystemJobId, SchedulerError> {
        let job_id = self.next_job_id();
        let start = Utc::now().format(TIME_FORMAT).to_string();
        info!(job_id, job_name = %request.job_name, "running job serially");

        let output = run_shell(&request.command).await?;
        let end = Utc::now().format(TIME_FORMAT).to_string();

        Self::write_logs(request, job_id, &start, &end, &output).map_err(|source| {
            SchedulerError::Invocation {
                command: request.command.clone(),
                source,
            }
        })?;

        output
            .into_success(&request.command)
            .map(|_| SystemJobId(job_id.to_string()))
    }

    /// All serially run jobs are complete by the time submission returns.
    async fn check_job_status(
        &self,
        _job_id: &SystemJobId,
        _additional_args: &[String],
    ) -> Result<SchedulerStatus, SchedulerError> {
        Ok(SchedulerStatus::Completed)
    }

    /// Nothing to kill; the job only ever runs inside submission.
    async fn kill_job(
        &self,
        _job_id: &SystemJobId,
        _additional_args: &[String],
    ) -> Result<(), SchedulerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn jobs_run_to_completion_with_framed_logs() {
        let dir = TempDir::new().unwrap();
        let stdout_log = dir.path().join("job.out");
        let stderr_log = dir.path().join("job.err");
        let scheduler = SerialJobScheduler::new();
        let request = SubmitRequest::new("echo forward; echo backward >&2", "echo_step")
            .with_stdout_logfile(&stdout_log)
            .with_stderr_logfile(&stderr_log);

        let job_id = scheduler.submit_job(&request).await.unwrap();
        assert_eq!(job_id, SystemJobId("1".to_string()));

        let log = std::fs::read_to_string(&stdout_log).unwrap();
        assert!(log.contains("Job submission ID: 1"));
        assert!(log.contains("Successfully completed."));
        assert!(log.contains("------------STDOUT------------"));
        assert!(log.contains("forward"));
        assert_eq!(std::fs::read_to_string(&stderr_log).unwrap(), "backward\n");

        let status = scheduler.check_job_status(&job_id, &[]).await.unwrap();
        assert_eq!(status, SchedulerStatus::Completed);
        assert!(scheduler.kill_job(&job_id, &[]).await.is_ok());
    }

    #[tokio::test]
    async fn failed_jobs_surface_the_exit_status() {
        let dir = TempDir::new().unwrap();
        let stdout_log = dir.path().join("job.out");
        let scheduler = SerialJobScheduler::new();
        let request =
            SubmitRequest::new("exit 2", "failing_step").with_stdout_logfile(&stdout_log);

        let error = scheduler.submit_job(&request).await.unwrap_err();
        assert!(matches!(error, SchedulerError::CommandFailed { .. }));
        let log = std::fs::read_to_string(&stdout_log).unwrap();
        assert!(log.contains("FAILURE"));
    }

    #[tokio::test]
    async fn job_ids_count_submissions() {
        let scheduler = SerialJobScheduler::new();
        let first = scheduler
            .submit_job(&SubmitRequest::new("true", "a"))
            .await
            .unwrap();
        let second = scheduler
            .submit_job(&SubmitRequest::new("true", "b"))
            .await
            .unwrap();
        assert_eq!(first.0, "1");
        assert_eq!(second.0, "2");
    }
}
