//! Layered configuration
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults (serde defaults below)
//! 2. TOML file: `--config <path>`, or `<config_dir>/experiment-watchdog/watchdog.toml`
//!    when it exists
//! 3. environment: `WATCHDOG_<SECTION>__<KEY>`, e.g. `WATCHDOG_BOARD__HOST=10.30.3.51`
//!
//! A missing `[relay]` section selects relaunch-only recovery.

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use watchdog_core::application::{
    EscalationLadder, LadderStep, LaunchPolicy, RelaunchPolicy, SupervisorConfig,
};

const ENV_PREFIX: &str = "WATCHDOG";
const CONFIG_FILE_NAME: &str = "watchdog.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub board: BoardSettings,
    #[serde(default)]
    pub relay: Option<RelaySettings>,
    #[serde(default)]
    pub notify: NotifySettings,
    #[serde(default)]
    pub supervisor: SupervisorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSettings {
    pub host: String,
    #[serde(default = "default_user")]
    pub user: String,
    /// Remote command printing the progress token
    pub probe_command: String,
    /// Remote command launching the experiment
    pub start_command: String,
    #[serde(default = "default_ssh_program")]
    pub ssh_program: String,
    #[serde(default)]
    pub ssh_extra_args: Vec<String>,
    #[serde(default = "default_ssh_connect_timeout")]
    pub ssh_connect_timeout_secs: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_secs: u64,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// e.g. `http://10.30.3.203`
    pub base_url: String,
    /// Device name the relay must report before any power action
    pub expected_name: String,
    #[serde(default)]
    pub channel: u8,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Environment variable holding the chat id
    #[serde(default = "default_chat_id_env")]
    pub chat_id_env: String,
    /// Environment variable holding the bot token
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LadderStepSettings {
    pub below_secs: u64,
    pub wait_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    pub startup_delay_secs: u64,
    pub healthy_interval_secs: u64,
    pub progress_notify_interval_secs: u64,
    pub grace_period_secs: u64,
    pub max_consecutive_failures: u32,
    pub recover_after_secs: u64,
    pub ladder: Vec<LadderStepSettings>,
    pub start_retry_interval_secs: u64,
    pub start_retry_ceiling_secs: u64,
    pub relaunch_max_attempts: u32,
    pub relaunch_max_elapsed_secs: u64,
    pub relaunch_retry_interval_secs: u64,
}

fn default_user() -> String {
    "root".to_string()
}
fn default_ssh_program() -> String {
    "ssh".to_string()
}
fn default_ssh_connect_timeout() -> u64 {
    1
}
fn default_ping_timeout() -> u64 {
    2
}
fn default_command_timeout() -> u64 {
    15
}
fn default_request_timeout() -> u64 {
    10
}
fn default_settle_delay() -> u64 {
    10
}
fn default_chat_id_env() -> String {
    "TELEGRAM_CHATID".to_string()
}
fn default_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            chat_id_env: default_chat_id_env(),
            token_env: default_token_env(),
            timeout_secs: default_request_timeout(),
            api_base: None,
        }
    }
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        let core = SupervisorConfig::default();
        Self {
            startup_delay_secs: core.startup_delay.as_secs(),
            healthy_interval_secs: core.healthy_interval.as_secs(),
            progress_notify_interval_secs: core.progress_notify_interval.as_secs(),
            grace_period_secs: core.grace_period.as_secs(),
            max_consecutive_failures: core.max_consecutive_failures,
            recover_after_secs: core.ladder.recover_after().as_secs(),
            ladder: core
                .ladder
                .steps()
                .iter()
                .map(|step| LadderStepSettings {
                    below_secs: step.below.as_secs(),
                    wait_secs: step.wait.as_secs(),
                })
                .collect(),
            start_retry_interval_secs: core.launch.retry_interval.as_secs(),
            start_retry_ceiling_secs: core.launch.ceiling.as_secs(),
            relaunch_max_attempts: core.relaunch.max_attempts,
            relaunch_max_elapsed_secs: core.relaunch.max_elapsed.as_secs(),
            relaunch_retry_interval_secs: core.relaunch.retry_interval.as_secs(),
        }
    }
}

impl SupervisorSettings {
    /// Convert to the validated core configuration
    pub fn to_config(&self) -> watchdog_core::Result<SupervisorConfig> {
        let steps = self
            .ladder
            .iter()
            .map(|step| LadderStep {
                below: Duration::from_secs(step.below_secs),
                wait: Duration::from_secs(step.wait_secs),
            })
            .collect();
        let ladder = EscalationLadder::new(steps, Duration::from_secs(self.recover_after_secs))?;

        let config = SupervisorConfig {
            startup_delay: Duration::from_secs(self.startup_delay_secs),
            healthy_interval: Duration::from_secs(self.healthy_interval_secs),
            progress_notify_interval: Duration::from_secs(self.progress_notify_interval_secs),
            grace_period: Duration::from_secs(self.grace_period_secs),
            max_consecutive_failures: self.max_consecutive_failures,
            ladder,
            launch: LaunchPolicy {
                retry_interval: Duration::from_secs(self.start_retry_interval_secs),
                ceiling: Duration::from_secs(self.start_retry_ceiling_secs),
            },
            relaunch: RelaunchPolicy {
                max_attempts: self.relaunch_max_attempts,
                max_elapsed: Duration::from_secs(self.relaunch_max_elapsed_secs),
                retry_interval: Duration::from_secs(self.relaunch_retry_interval_secs),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl Settings {
    /// Load settings from file (explicit or default location) and environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
                builder = builder.add_source(File::with_name(&expanded).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    builder = builder.add_source(File::from(default_path).required(false));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("board.ssh_extra_args"),
        );

        Self::build(builder)
    }

    /// Parse settings from TOML text only
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.board.ping_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.board.command_timeout_secs)
    }
}

/// `<config_dir>/experiment-watchdog/watchdog.toml`
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "experiment-watchdog")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
