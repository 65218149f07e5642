//! Shared harness: a supervisor wired to in-memory adapters and a simulated clock

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use watchdog_core::application::{
    shutdown_channel, ExperimentLauncher, Notices, Recovery, RelayController, Supervisor,
    SupervisorConfig, SupervisorOutcome,
};
use watchdog_core::domain::{ProbeResult, SupervisorState};
use watchdog_core::port::experiment_starter::mocks::MockExperimentStarter;
use watchdog_core::port::notifier::mocks::RecordingNotifier;
use watchdog_core::port::probe_client::mocks::MockProbeClient;
use watchdog_core::port::relay_api::mocks::MockRelayApi;
use watchdog_core::port::time_provider::mocks::SimulatedTimeProvider;
use watchdog_core::port::TimeProvider;

pub const RELAY_NAME: &str = "Zarquon";

pub fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

pub fn mins_secs(m: u64, s: u64) -> i64 {
    ((m * 60 + s) * 1000) as i64
}

pub struct Harness {
    pub clock: Arc<SimulatedTimeProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub starter: Arc<MockExperimentStarter>,
    pub relay: Arc<MockRelayApi>,
    pub config: SupervisorConfig,
    pub power_control: bool,
}

pub struct RunReport {
    pub outcome: SupervisorOutcome,
    pub history: Vec<SupervisorState>,
}

impl RunReport {
    pub fn entered(&self, state: &SupervisorState) -> usize {
        self.history.iter().filter(|s| *s == state).count()
    }
}

impl Harness {
    /// Power-cycle recovery, relay powered on, starter always succeeds
    pub fn with_relay() -> Self {
        Self {
            clock: Arc::new(SimulatedTimeProvider::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            starter: Arc::new(MockExperimentStarter::new_success()),
            relay: Arc::new(MockRelayApi::new(RELAY_NAME, true)),
            config: SupervisorConfig::default(),
            power_control: true,
        }
    }

    /// Relaunch-only recovery
    pub fn without_relay(starter: MockExperimentStarter) -> Self {
        Self {
            starter: Arc::new(starter),
            power_control: false,
            ..Self::with_relay()
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn supervisor(&self, probe: MockProbeClient) -> Supervisor {
        let launcher = Arc::new(ExperimentLauncher::new(
            self.starter.clone(),
            self.clock.clone(),
            self.config.launch,
        ));
        let recovery = if self.power_control {
            Recovery::PowerCycle(Arc::new(RelayController::new(
                self.relay.clone(),
                self.clock.clone(),
                RELAY_NAME,
            )))
        } else {
            Recovery::Relaunch
        };
        let notices = Notices::new(
            self.notifier.clone(),
            self.clock.clone(),
            self.config.progress_notify_interval,
        );
        Supervisor::new(
            self.config.clone(),
            recovery,
            Arc::new(probe),
            launcher,
            notices,
            self.clock.clone(),
        )
    }

    pub async fn run(&self, probe: MockProbeClient) -> RunReport {
        let mut supervisor = self.supervisor(probe);
        let (_shutdown_tx, shutdown_rx) = shutdown_channel();
        let outcome = supervisor.run(shutdown_rx).await;
        RunReport {
            outcome,
            history: supervisor.history().to_vec(),
        }
    }

    /// Probe answering by simulated time: `unreachable` before `down_until`,
    /// `progress` until `end_at`, END afterwards
    pub fn probe_by_time(&self, down_until: i64, progress: &str, end_at: i64) -> MockProbeClient {
        let clock = self.clock.clone();
        let progress = progress.to_string();
        MockProbeClient::from_fn(move |_| {
            let now = clock.now_millis();
            if now < down_until {
                ProbeResult::unreachable()
            } else if now < end_at {
                ProbeResult::from_output(&progress)
            } else {
                ProbeResult::from_output("END")
            }
        })
    }
}
