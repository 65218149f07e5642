//! Experiment Watchdog - Main Entry Point
//! Supervises a long-running experiment on a remote board and recovers it
//! from hangs by relaunching or power-cycling through a network relay.

mod commands;
mod logging;
mod settings;
mod wiring;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};

use watchdog_core::application::{shutdown_channel, SupervisorOutcome};
use watchdog_core::VERSION;

use crate::commands::{NoticeAction, RelayAction};
use crate::settings::Settings;
use crate::wiring::Components;

/// Exit code for configuration and startup errors
const EXIT_CONFIG_ERROR: u8 = 2;
/// Bound on waiting for an in-flight recovery after a shutdown request
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "experiment-watchdog")]
#[command(about = "Remote experiment supervisor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "WATCHDOG_CONFIG")]
    config: Option<PathBuf>,

    /// Ignore the relay section and recover by relaunching only
    #[arg(long)]
    no_relay: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Supervise the experiment until it finishes (default)
    Run,

    /// Probe the board once and print the result
    Probe {
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the experiment, retrying until the start ceiling
    Start,

    /// Manual relay control (identity is verified first)
    Relay {
        #[command(subcommand)]
        action: RelayCommand,
    },

    /// Send a notice through the configured notifier
    Notify {
        #[command(subcommand)]
        action: NotifyCommand,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum RelayCommand {
    /// Show relay name and position
    Status,
    /// Switch the board on
    On,
    /// Switch the board off
    Off,
    /// Off, settle, on
    Cycle,
}

#[derive(Subcommand)]
enum NotifyCommand {
    /// Report experiment progress
    Progress {
        /// Progress token, e.g. "[3/12]"
        progress: String,
    },
    /// Report a stuck power meter
    Stuck {
        /// Replaces the default wording
        words: Vec<String>,
    },
    /// Announce a manual reboot
    Reboot,
    /// Announce the end of the campaign
    Finish,
    /// Free-form message
    Text {
        message: String,
    },
}

impl From<RelayCommand> for RelayAction {
    fn from(command: RelayCommand) -> Self {
        match command {
            RelayCommand::Status => RelayAction::Status,
            RelayCommand::On => RelayAction::On,
            RelayCommand::Off => RelayAction::Off,
            RelayCommand::Cycle => RelayAction::Cycle,
        }
    }
}

impl From<NotifyCommand> for NoticeAction {
    fn from(command: NotifyCommand) -> Self {
        match command {
            NotifyCommand::Progress { progress } => NoticeAction::Progress(progress),
            NotifyCommand::Stuck { words } => NoticeAction::Stuck(words),
            NotifyCommand::Reboot => NoticeAction::Reboot,
            NotifyCommand::Finish => NoticeAction::Finish,
            NotifyCommand::Text { message } => NoticeAction::Text(message),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The guard must outlive every log call
    let _log_guard = match logging::init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    info!("Experiment Watchdog v{} starting...", VERSION);

    let components = match load(&cli) {
        Ok(components) => components,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Startup failed");
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match dispatch(cli.command.unwrap_or(Commands::Run), components).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn load(cli: &Cli) -> Result<Components> {
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    Components::build(settings, cli.no_relay)
}

async fn dispatch(command: Commands, components: Components) -> Result<u8> {
    match command {
        Commands::Run => run_supervisor(components).await,
        Commands::Probe { json } => commands::probe(&components, json).await,
        Commands::Start => commands::start(&components).await,
        Commands::Relay { action } => commands::relay(&components, action.into()).await,
        Commands::Notify { action } => commands::notify(&components, action.into()).await,
        Commands::Config => commands::show_config(&components),
    }
}

async fn run_supervisor(components: Components) -> Result<u8> {
    info!(
        host = %components.settings.board.host,
        recovery = %components.recovery().label(),
        notifications = %components.notifier.is_enabled(),
        "Starting supervisor"
    );
    info!("Press Ctrl+C to shutdown");

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let mut supervisor = components.supervisor();
    let mut handle = tokio::spawn(async move { supervisor.run(shutdown_rx).await });

    let outcome = tokio::select! {
        joined = &mut handle => joined.context("Supervisor task failed")?,
        _ = shutdown_signal() => {
            info!("Shutdown signal received. Waiting for the supervisor to stop...");
            shutdown_tx.shutdown();
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut handle).await {
                Ok(joined) => joined.context("Supervisor task failed")?,
                Err(_) => {
                    warn!(
                        timeout_secs = %SHUTDOWN_TIMEOUT.as_secs(),
                        "Supervisor busy in recovery, exiting anyway"
                    );
                    handle.abort();
                    SupervisorOutcome::Interrupted
                }
            }
        }
    };

    match &outcome {
        SupervisorOutcome::Finished => info!("Experiments finished, exiting"),
        SupervisorOutcome::Fatal(fault) => error!(kind = %fault.kind(), error = %fault, "Supervisor stopped on fault"),
        SupervisorOutcome::Interrupted => info!("Shutdown complete."),
    }
    Ok(outcome.exit_code())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
