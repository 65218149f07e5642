// Subprocess runner with hard timeouts
// reason: tokio for async process management
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use watchdog_core::port::TimeProvider;

/// Environment passed through to child processes by default
///
/// `SSH_AUTH_SOCK` lets ssh reach a running agent.
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "SSH_AUTH_SOCK"];

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Transport-level failures; callers turn these into data
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Runs short-lived commands (ping, ssh) with environment allowlisting
///
/// A process that outlives its timeout is killed.
pub struct CommandRunner {
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
}

impl CommandRunner {
    /// Create a new command runner
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `env_allowlist` - Environment variables inherited by children
    pub fn new(time_provider: Arc<dyn TimeProvider>, env_allowlist: Vec<String>) -> Self {
        Self {
            time_provider,
            env_allowlist,
        }
    }

    pub fn with_default_env(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::new(
            time_provider,
            DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        env.iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Run `program` with `args`, bounded by `limit`
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        limit: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let start_time = self.time_provider.now_millis();
        let env: HashMap<String, String> = std::env::vars().collect();

        debug!(
            program = %program,
            args = ?args,
            timeout_ms = %limit.as_millis(),
            "Running command"
        );

        let child = Command::new(program)
            .args(args)
            .env_clear()
            .envs(self.filter_env(&env))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::SpawnFailed(format!("{}: {}", program, e)))?;

        // Dropping the wait future on timeout kills the child
        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(CommandError::IoError(e.to_string())),
            Err(_) => {
                warn!(program = %program, timeout_ms = %limit.as_millis(), "Command timed out, killed");
                return Err(CommandError::Timeout(limit.as_millis() as u64));
            }
        };

        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
        };

        debug!(
            program = %program,
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            "Command completed"
        );

        Ok(result)
    }
}
