// SSH probe client (ping, then remote progress command)
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use watchdog_core::domain::ProbeResult;
use watchdog_core::port::ProbeClient;

use crate::command::CommandRunner;
use crate::ssh::SshTarget;

/// Probes the board with one ICMP echo and, if it answers, the remote
/// progress command
///
/// Fails fast: an unreachable board is reported without attempting ssh,
/// so one probe never stacks several transport timeouts.
pub struct SshProbeClient {
    runner: Arc<CommandRunner>,
    target: SshTarget,
    probe_command: String,
    ping_program: String,
    ping_timeout: Duration,
    command_timeout: Duration,
}

impl SshProbeClient {
    /// Create a new probe client
    ///
    /// # Arguments
    /// * `runner` - Subprocess runner
    /// * `target` - Board ssh target (its host is also pinged)
    /// * `probe_command` - Remote command printing the progress token
    /// * `ping_timeout` - Wait for the echo reply
    /// * `command_timeout` - Bound on the whole ssh invocation
    pub fn new(
        runner: Arc<CommandRunner>,
        target: SshTarget,
        probe_command: impl Into<String>,
        ping_timeout: Duration,
        command_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            target,
            probe_command: probe_command.into(),
            ping_program: "ping".to_string(),
            ping_timeout,
            command_timeout,
        }
    }

    pub fn with_ping_program(mut self, program: impl Into<String>) -> Self {
        self.ping_program = program.into();
        self
    }

    fn ping_args(&self) -> Vec<String> {
        vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            self.ping_timeout.as_secs().max(1).to_string(),
            self.target.host.clone(),
        ]
    }

    /// Single ICMP echo; any failure means unreachable
    pub async fn ping(&self) -> bool {
        // Leave the ping binary its own -W before the hard kill
        let limit = self.ping_timeout + Duration::from_secs(1);
        match self.runner.run(&self.ping_program, &self.ping_args(), limit).await {
            Ok(output) if output.success() => {
                debug!(host = %self.target.host, "Ping successful");
                true
            }
            Ok(output) => {
                warn!(
                    host = %self.target.host,
                    stderr = %output.stderr.trim(),
                    "Could not ping board"
                );
                false
            }
            Err(e) => {
                warn!(host = %self.target.host, error = %e, "Could not ping board");
                false
            }
        }
    }
}

#[async_trait]
impl ProbeClient for SshProbeClient {
    async fn check(&self) -> ProbeResult {
        info!(host = %self.target.host, "Check in progress");
        if !self.ping().await {
            return ProbeResult::unreachable();
        }

        let args = self.target.command_args(&self.probe_command);
        match self
            .runner
            .run(&self.target.program, &args, self.command_timeout)
            .await
        {
            Ok(output) if output.success() => {
                let result = ProbeResult::from_output(&output.stdout);
                info!(probe = %result, duration_ms = output.duration_ms, "Check completed");
                result
            }
            Ok(output) => {
                warn!(
                    exit_code = ?output.exit_code,
                    stderr = %output.stderr.trim(),
                    "Progress command failed"
                );
                ProbeResult::no_progress()
            }
            Err(e) => {
                warn!(error = %e, "Progress command did not run");
                ProbeResult::no_progress()
            }
        }
    }
}
