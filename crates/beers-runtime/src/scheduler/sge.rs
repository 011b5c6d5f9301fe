//! Sun Grid Engine (SGE) scheduler backend.

use std::sync::LazyLock;

use async_trait::async_trait;
use beers_core::ports::{
    JobScheduler, SchedulerError, SchedulerStatus, SubmitRequest, SystemJobId,
};
use regex::Regex;
use tracing::debug;

use crate::scheduler::SchedulerDefaults;
use crate::shell::run_shell;

// qstat output, including its header line. The state sits in the fifth
// column, after prior, name, and user.
static QSTAT_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"job-ID\s+prior\s+name\s+user\s+state\s+submit/start at\s+queue\s+slots\s+ja-task-ID\n(?P<job_id>\d+?)\s+\S+\s+\S+\s+\S+\s+(?P<job_status>\S+?)\s+.*",
    )
    .unwrap()
});

// Job id announcement following qsub.
static QSUB_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Your job (?P<job_id>\d+?) \(.*\)  has been submitted").unwrap()
});

// qdel confirmation message.
static QDEL_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".* has registered the job (?P<job_id>\d+?) for deletion(?P<qdel_message>[^\n]+?)\n?$")
        .unwrap()
});

/// Wrapper around the SGE scheduler, driving the `qsub`, `qstat`, and `qdel`
/// commands.
#[derive(Debug, Clone)]
pub struct SgeJobScheduler {
    defaults: SchedulerDefaults,
}

impl SgeJobScheduler {
    pub fn new(defaults: SchedulerDefaults) -> Self {
        Self { defaults }
    }

    fn qsub_command(&self, request: &SubmitRequest) -> String {
        let num_processors = request
            .num_processors
            .unwrap_or(self.defaults.num_processors);
        let memory = request.memory_in_mb.unwrap_or(self.defaults.memory_in_mb);
        let mut command = format!(
            "qsub -N \"{}\" -V -cwd -n {num_processors} -R \"span[hosts=1]\" -l h_vmem={memory}M",
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

impl Default for SgeJobScheduler {
    fn default() -> Self {
        Self::new(SchedulerDefaults::default())
    }
}

#[async_trait]
impl JobScheduler for SgeJobScheduler {
    /// Submit the job with `qsub` and return the id SGE assigned it.
    async fn submit_job(&self, request: &SubmitRequest) -> Result<SystemJobId, SchedulerError> {
        let command = self.qsub_command(request);
        debug!(job_name = %request.job_name, %command, "submitting job to sge");
        let output = run_shell(&command).await?.into_success(&command)?;
        let merged = output.merged();
        match QSUB_OUTPUT.captures(&merged) {
            Some(captures) => Ok(SystemJobId(captures["job_id"].to_string())),
            None => Err(SchedulerError::UnparsableOutput { output: merged }),
        }
    }

    /// Look the job up with `qstat` and map SGE's state codes.
    async fn check_job_status(
        &self,
        job_id: &SystemJobId,
        additional_args: &[String],
    ) -> Result<SchedulerStatus, SchedulerError> {
        let command = format!("qstat {} {job_id}", additional_args.join(" "));
        let output = run_shell(&command).await?.into_success(&command)?;
        let merged = output.merged();
        let Some(captures) = QSTAT_OUTPUT.captures(&merged) else {
            return Err(SchedulerError::UnparsableOutput { output: merged });
        };
        match &captures["job_status"] {
            "r" => Ok(SchedulerStatus::Running),
            "qw" | "WAIT" => Ok(SchedulerStatus::Pending),
            "EXIT" | "ZOMBI" | "UNKWN" => Ok(SchedulerStatus::Failed),
            "DONE" => Ok(SchedulerStatus::Completed),
            _ => Err(SchedulerError::UnparsableOutput { output: merged }),
        }
    }

    /// Kill the job with `qdel`.
    ///
    /// qdel exits non-zero when the job does not exist or already finished,
    /// so success is judged from its message rather than the exit status.
    async fn kill_job(
        &self,
        job_id: &SystemJobId,
        additional_args: &[String],
    ) -> Result<(), SchedulerError> {
        let command = format!("qdel {} {job_id}", additional_args.join(" "));
        let output = run_shell(&command).await?;
        let merged = output.merged();
        let message = QDEL_OUTPUT
            .captures(&merged)
            .map(|captures| captures["qdel_message"].to_string())
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
    fn qsub_output_yields_the_job_id() {
        let captures = QSUB_OUTPUT
            .captures("Your job 4417292 (\"step_4\")  has been submitted\n")
            .unwrap();
        assert_eq!(&captures["job_id"], "4417292");
    }

    #[test]
    fn qstat_output_yields_the_state_column() {
        let output = "job-ID  prior   name       user         state submit/start at     queue                          slots ja-task-ID\n\
                      4417292 0.55500 step_4     franklin     r     06/05/2024 10:06:55 all.q@node001                      1\n";
        let captures = QSTAT_OUTPUT.captures(output).unwrap();
        assert_eq!(&captures["job_id"], "4417292");
        assert_eq!(&captures["job_status"], "r");

        // The state column, not the name or user column, must be captured.
        let queued = "job-ID  prior   name       user         state submit/start at     queue                          slots ja-task-ID\n\
                      4417293 0.00000 step_5     franklin     qw    06/05/2024 10:07:02                                    1\n";
        let captures = QSTAT_OUTPUT.captures(queued).unwrap();
        assert_eq!(&captures["job_status"], "qw");
    }

    #[test]
    fn qsub_command_carries_resources() {
        let scheduler = SgeJobScheduler::default();
        let request = SubmitRequest::new("run_step --job 4", "step_4").with_memory_in_mb(4000);
        let command = scheduler.qsub_command(&request);
        assert!(command.starts_with("qsub -N \"step_4\" -V -cwd"));
        assert!(command.contains("-l h_vmem=4000M"));
        assert!(command.ends_with("run_step --job 4"));
    }
}
