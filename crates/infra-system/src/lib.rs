// Watchdog Infrastructure - Process Adapters
// Implements: ProbeClient, ExperimentStarter over ping + ssh

pub mod command;
pub mod experiment_starter;
pub mod probe_client;
pub mod ssh;

pub use command::{CommandError, CommandOutput, CommandRunner, DEFAULT_ENV_ALLOWLIST};
pub use experiment_starter::SshExperimentStarter;
pub use probe_client::SshProbeClient;
pub use ssh::SshTarget;
