//! Load Sharing Facility (LSF) scheduler backend.

use std::sync::LazyLock;

use async_trait::async_trait;
use beers_core::ports::{
    JobScheduler, SchedulerError, SchedulerStatus, SubmitRequest, SystemJobId,
};
use regex::Regex;
use tracing::debug;

use crate::scheduler::SchedulerDefaults;
use crate::shell::run_shell;

// bjobs output, including its header line.
static BJOBS_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"JOBID\s+USER\s+STAT\s+QUEUE\s+FROM_HOST\s+EXEC_HOST\s+JOB_NAME\s+SUBMIT_TIME\n(?P<job_id>\d+?)\s+\S+\s+(?P<job_status>\S+?)\s+.*",
    )
    .unwrap()
});

// Job id announcement following bsub.
static BSUB_OUTPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Job <(?P<job_id>\d+?)> is submitted .*").unwrap());

// bkill confirmation message.
static BKILL_OUTPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Job <(?P<job_id>\d+?)>(?P<bkill_message>[^\n]+?)\n?$").unwrap());

/// Wrapper around the LSF scheduler, driving the `bsub`, `bjobs`, and `bkill`
/// commands.
#[derive(Debug, Clone)]
pub struct LsfJobScheduler {
    defaults: SchedulerDefaults,
}

impl LsfJobScheduler {
    pub fn new(defaults: SchedulerDefaults) -> Self {
        Self { defaults }
    }

    fn bsub_command(&self, request: &SubmitRequest) -> String {
        let num_processors = request
            .num_processors
            .unwrap_or(self.defaults.num_processors);
        let memory = request.memory_in_mb.unwrap_or(self.defaults.memory_in_mb);
        let mut command = format!(
            "bsub -J \"{}\" -n {num_processors} -R \"span[hosts=1]\" -M {memory} -R \"rusage[mem={memory}]\"",
            request.job_name
        );
        if let Some(stdout_logfile) = &request.stdout_logfile {
            command.push_str(&format!(" -oo {}", stdout_logfile.display()));
        }
        if let Some(stderr_logfile) = &request.stderr_logfile {
            command.push_str(&format!(" -eo {}", stderr_logfile.display()));
        }
        for arg in &request.additional_args {
            command.push(' ');
            command.push_str(arg);
        }
        command.push(' ');
        command.push_str(&request.command);
        command
    }
}

impl Default for LsfJobScheduler {
    fn default() -> Self {
        Self::new(SchedulerDefaults::default())
    }
}

#[async_trait]
impl JobScheduler for LsfJobScheduler {
    /// Submit the job with `bsub` and return the id LSF assigned it.
    async fn submit_job(&self, request: &SubmitRequest) -> Result<SystemJobId, SchedulerError> {
        let command = self.bsub_command(request);
        debug!(job_name = %request.job_name, %command, "submitting job to lsf");
        let output = run_shell(&command).await?.into_success(&command)?;
        let merged = output.merged();
        match BSUB_OUTPUT.captures(&merged) {
            Some(captures) => Ok(SystemJobId(captures["job_id"].to_string())),
            None => Err(SchedulerError::UnparsableOutput { output: merged }),
        }
    }

    /// Look the job up with `bjobs` and map LSF's state codes.
    async fn check_job_status(
        &self,
        job_id: &SystemJobId,
        additional_args: &[String],
    ) -> Result<SchedulerStatus, SchedulerError> {
        let command = format!("bjobs {} {job_id}", additional_args.join(" "));
        let output = run_shell(&command).await?.into_success(&command)?;
        let merged = output.merged();
        let Some(captures) = BJOBS_OUTPUT.captures(&merged) else {
            return Err(SchedulerError::UnparsableOutput { output: merged });
        };
        match &captures["job_status"] {
            "RUN" => Ok(SchedulerStatus::Running),
            "PEND" | "WAIT" => Ok(SchedulerStatus::Pending),
            "EXIT" | "UNKWN" => Ok(SchedulerStatus::Failed),
            "DONE" => Ok(SchedulerStatus::Completed),
            _ => Err(SchedulerError::UnparsableOutput { output: merged }),
        }
    }

    /// Kill the job with `bkill`.
    ///
    /// bkill exits non-zero when the job does not exist or already finished,
    /// so success is judged from its message rather than the exit status.
    async fn kill_job(
        &self,
        job_id: &SystemJobId,
        additional_args: &[String],
    ) -> Result<(), SchedulerError> {
        let command = format!("bkill {} {job_id}", additional_args.join(" "));
        let output = run_shell(&command).await?;
        let merged = output.merged();
        let message = BKILL_OUTPUT
            .captures(&merged)
            .map(|captures| captures["bkill_message"].to_string())
            .ok_or_else(|| SchedulerError::UnparsableOutput {
                output: merged.clone(),
            })?;
        if message == " is being terminated" || message == ": Job has already finished" {
            Ok(())
        } else {
            Err(SchedulerError::CommandFailed {
                command,
                exit: output.exit,
                stderr: merged,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bsub_output_yields_the_job_id() {
        let captures = BSUB_OUTPUT
            .captures("Job <2258418> is submitted to default queue <normal>.\n")
            .unwrap();
        assert_eq!(&captures["job_id"], "2258418");
    }

    #[test]
    fn bjobs_output_yields_the_state_column() {
        let output = "JOBID   USER    STAT  QUEUE      FROM_HOST   EXEC_HOST   JOB_NAME   SUBMIT_TIME\n\
                      2258418 crick   RUN   normal     node001     node002     step1      Jun  5 10:06\n";
        let captures = BJOBS_OUTPUT.captures(output).unwrap();
        assert_eq!(&captures["job_id"], "2258418");
        assert_eq!(&captures["job_status"], "RUN");
    }

    #[test]
    fn bkill_output_yields_the_message() {
        let captures = BKILL_OUTPUT
            .captures("Job <2258418> is being terminated\n")
            .unwrap();
        assert_eq!(&captures["bkill_message"], " is being terminated");
    }

    #[test]
    fn bsub_command_carries_resources_and_logs() {
        let scheduler = LsfJobScheduler::default();
        let request = SubmitRequest::new("run_step --job 4", "step_4")
            .with_num_processors(2)
            .with_memory_in_mb(8000)
            .with_stdout_logfile("/logs/step4.out")
            .with_stderr_logfile("/logs/step4.err");
        let command = scheduler.bsub_command(&request);
        assert_eq!(
            command,
            "bsub -J \"step_4\" -n 2 -R \"span[hosts=1]\" -M 8000 -R \"rusage[mem=8000]\" \
             -oo /logs/step4.out -eo /logs/step4.err run_step --job 4"
        );
    }

    #[test]
    fn bsub_command_falls_back_to_defaults() {
        let scheduler = LsfJobScheduler::default();
        let command = scheduler.bsub_command(&SubmitRequest::new("true", "noop"));
        assert!(command.contains("-n 1"));
        assert!(command.contains("-M 6000"));
    }
}
