// Dependency wiring: settings -> adapters -> application services
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use watchdog_core::application::{
    ExperimentLauncher, Notices, RelayController, Recovery, Supervisor, SupervisorConfig,
};
use watchdog_core::port::time_provider::SystemTimeProvider;
use watchdog_core::port::TimeProvider;
use watchdog_infra_http::{BotCredentials, HttpRelayApi, TelegramNotifier};
use watchdog_infra_system::{CommandRunner, SshExperimentStarter, SshProbeClient, SshTarget};

use crate::settings::Settings;

/// Everything the supervisor and the operator subcommands need
pub struct Components {
    pub settings: Settings,
    pub config: SupervisorConfig,
    pub time_provider: Arc<dyn TimeProvider>,
    pub probe: Arc<SshProbeClient>,
    pub launcher: Arc<ExperimentLauncher>,
    /// None in relaunch-only mode
    pub relay: Option<Arc<RelayController>>,
    pub notifier: Arc<TelegramNotifier>,
}

impl Components {
    pub fn build(settings: Settings, no_relay: bool) -> Result<Self> {
        let config = settings
            .supervisor
            .to_config()
            .context("Invalid supervisor configuration")?;

        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider::new());
        let runner = Arc::new(CommandRunner::with_default_env(time_provider.clone()));

        let board = &settings.board;
        let mut target = SshTarget::new(&board.user, &board.host);
        target.program = board.ssh_program.clone();
        target.connect_timeout = Duration::from_secs(board.ssh_connect_timeout_secs);
        target.extra_args = board.ssh_extra_args.clone();

        let probe = Arc::new(SshProbeClient::new(
            runner.clone(),
            target.clone(),
            &board.probe_command,
            settings.ping_timeout(),
            settings.command_timeout(),
        ));

        let starter = Arc::new(SshExperimentStarter::new(
            runner,
            target,
            &board.start_command,
            settings.command_timeout(),
        ));
        let launcher = Arc::new(ExperimentLauncher::new(
            starter,
            time_provider.clone(),
            config.launch,
        ));

        let relay = match (&settings.relay, no_relay) {
            (Some(relay), false) => {
                let api = HttpRelayApi::new(
                    &relay.base_url,
                    Duration::from_secs(relay.request_timeout_secs),
                )
                .with_context(|| format!("Invalid relay URL {}", relay.base_url))?
                .with_channel(relay.channel);
                let controller =
                    RelayController::new(Arc::new(api), time_provider.clone(), &relay.expected_name)
                        .with_settle_delay(Duration::from_secs(relay.settle_delay_secs));
                Some(Arc::new(controller))
            }
            (Some(_), true) => {
                info!("Relay configured but disabled by --no-relay");
                None
            }
            (None, _) => None,
        };

        let credentials =
            BotCredentials::from_env(&settings.notify.chat_id_env, &settings.notify.token_env);
        if credentials.is_none() {
            warn!(
                chat_id_var = %settings.notify.chat_id_env,
                token_var = %settings.notify.token_env,
                "Telegram credentials not set, notifications disabled"
            );
        }
        let mut notifier = TelegramNotifier::new(
            credentials,
            Duration::from_secs(settings.notify.timeout_secs),
        )
        .context("Failed to build notification client")?;
        if let Some(api_base) = &settings.notify.api_base {
            notifier = notifier.with_api_base(api_base);
        }

        Ok(Self {
            settings,
            config,
            time_provider,
            probe,
            launcher,
            relay,
            notifier: Arc::new(notifier),
        })
    }

    pub fn notices(&self) -> Notices {
        Notices::new(
            self.notifier.clone(),
            self.time_provider.clone(),
            self.config.progress_notify_interval,
        )
    }

    pub fn recovery(&self) -> Recovery {
        match &self.relay {
            Some(relay) => Recovery::PowerCycle(relay.clone()),
            None => Recovery::Relaunch,
        }
    }

    pub fn supervisor(&self) -> Supervisor {
        Supervisor::new(
            self.config.clone(),
            self.recovery(),
            self.probe.clone(),
            self.launcher.clone(),
            self.notices(),
            self.time_provider.clone(),
        )
    }
}
