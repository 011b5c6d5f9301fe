//! Shell command execution for scheduler backends.
//!
//! Scheduler submission commands are assembled as full shell command lines
//! (they carry quoting and resource clauses), so they run through `sh -c`
//! rather than argv splitting.

use beers_core::ports::SchedulerError;
use tokio::process::Command;
use tracing::trace;

/// Captured result of a shell command.
#[derive(Debug)]
pub(crate) struct ShellOutput {
    pub success: bool,
    pub exit: String,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command line through the shell, capturing stdout and stderr.
///
/// A non-zero exit status is not an error here; callers that care use
/// [`ShellOutput::into_success`].
pub(crate) async fn run_shell(command: &str) -> Result<ShellOutput, SchedulerError> {
    trace!(command, "running shell command");
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .await
        .map_err(|source| SchedulerError::Invocation {
            command: command.to_string(),
            source,
        })?;
    Ok(ShellOutput {
        success: output.status.success(),
        exit: output.status.to_string(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

impl ShellOutput {
    /// Demand a successful exit, surfacing stderr in the error.
    pub(crate) fn into_success(self, command: &str) -> Result<Self, SchedulerError> {
        if self.success {
            Ok(self)
        } else {
            Err(SchedulerError::CommandFailed {
                command: command.to_string(),
                exit: self.exit,
                stderr: if self.stderr.is_empty() {
                    self.stdout
                } else {
                    self.stderr
                },
            })
        }
    }

    /// Stdout and stderr as the single stream schedulers print to.
    pub(crate) fn merged(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}{}", self.stdout, self.stderr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let output = run_shell("echo hello").await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_on_demand() {
        let output = run_shell("echo oops >&2; exit 3").await.unwrap();
        assert!(!output.success);
        let error = output.into_success("exit 3").unwrap_err();
        assert!(matches!(error, SchedulerError::CommandFailed { .. }));
        assert!(error.to_string().contains("oops"));
    }
}
