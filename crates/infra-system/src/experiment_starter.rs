// SSH experiment starter
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use watchdog_core::port::ExperimentStarter;

use crate::command::CommandRunner;
use crate::ssh::SshTarget;

/// Runs the remote start script; exit code 0 means "launched"
pub struct SshExperimentStarter {
    runner: Arc<CommandRunner>,
    target: SshTarget,
    start_command: String,
    command_timeout: Duration,
}

impl SshExperimentStarter {
    pub fn new(
        runner: Arc<CommandRunner>,
        target: SshTarget,
        start_command: impl Into<String>,
        command_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            target,
            start_command: start_command.into(),
            command_timeout,
        }
    }
}

#[async_trait]
impl ExperimentStarter for SshExperimentStarter {
    async fn attempt_start(&self) -> bool {
        let args = self.target.command_args(&self.start_command);
        match self
            .runner
            .run(&self.target.program, &args, self.command_timeout)
            .await
        {
            Ok(output) if output.success() => true,
            Ok(output) => {
                warn!(
                    exit_code = ?output.exit_code,
                    stderr = %output.stderr.trim(),
                    "Start command failed"
                );
                false
            }
            Err(e) => {
                warn!(error = %e, "Start command did not run");
                false
            }
        }
    }
}
