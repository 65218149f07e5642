// Application Layer - Recovery policies and the supervisor state machine

pub mod config;
pub mod constants;
pub mod escalation;
pub mod launcher;
pub mod notices;
pub mod relay_controller;
pub mod supervisor;

// Re-exports
pub use config::SupervisorConfig;
pub use escalation::{Escalation, EscalationLadder, LadderStep};
pub use launcher::{ExperimentLauncher, LaunchPolicy};
pub use notices::Notices;
pub use relay_controller::RelayController;
pub use supervisor::{
    shutdown_channel, Recovery, RelaunchPolicy, ShutdownSender, ShutdownToken, Supervisor,
    SupervisorOutcome, Timers,
};
