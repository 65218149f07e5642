//! Supervisor - the state machine keeping one unattended experiment alive
//!
//! ```text
//! STARTING ──▶ CHECKING ──▶ HEALTHY ──(wait)──▶ CHECKING
//!                 │  │
//!                 │  └──▶ DEGRADED ──(ladder wait)──▶ CHECKING
//!                 │           │
//!                 ▼           ▼
//!             FINISHED    RECOVERING ──(grace)──▶ CHECKING
//!                             │
//!                             ▼
//!                           FATAL
//! ```
//!
//! Faults are values: handlers return the next state, and a fault is just
//! `SupervisorState::Fatal`. Waits go through the injected clock and are
//! the only points where a shutdown request is honoured.

mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::SupervisorConfig;
use super::constants::{RELAUNCH_MAX_ATTEMPTS, RELAUNCH_MAX_ELAPSED, RELAUNCH_RETRY_INTERVAL};
use super::escalation::Escalation;
use super::launcher::ExperimentLauncher;
use super::notices::Notices;
use super::relay_controller::RelayController;
use crate::domain::{Fault, LaunchError, ProbeResult, ProbeStatus, SupervisorState};
use crate::port::{ProbeClient, TimeProvider};

/// Bounds of relaunch-only recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaunchPolicy {
    pub max_attempts: u32,
    pub max_elapsed: Duration,
    pub retry_interval: Duration,
}

impl Default for RelaunchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RELAUNCH_MAX_ATTEMPTS,
            max_elapsed: RELAUNCH_MAX_ELAPSED,
            retry_interval: RELAUNCH_RETRY_INTERVAL,
        }
    }
}

/// What RECOVERING does once the ladder is exhausted
pub enum Recovery {
    /// Power-cycle the board through the relay, then relaunch
    PowerCycle(Arc<RelayController>),
    /// No power control: bounded software relaunch attempts only
    Relaunch,
}

impl Recovery {
    pub fn label(&self) -> &'static str {
        match self {
            Recovery::PowerCycle(_) => "power-cycle",
            Recovery::Relaunch => "relaunch-only",
        }
    }
}

/// Loop bookkeeping, single owner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timers {
    /// Monotonic millis of the last probe that returned a usable token
    pub last_successful_check: Option<i64>,
    /// Non-zero iff the most recent probe returned no usable token
    pub consecutive_failures: u32,
    /// Failed probes since the liveness anchor was last re-armed
    pub outage_failures: u32,
    /// Instant the board was next expected to answer; outages count from here
    pub liveness_anchor: i64,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorOutcome {
    Finished,
    Fatal(Fault),
    /// Stopped by a shutdown request during a wait
    Interrupted,
}

impl SupervisorOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            SupervisorOutcome::Finished => 0,
            SupervisorOutcome::Fatal(_) => 1,
            SupervisorOutcome::Interrupted => 130,
        }
    }
}

/// Shutdown observed during a wait
struct Interrupted;

type Step = std::result::Result<SupervisorState, Interrupted>;

pub struct Supervisor {
    config: SupervisorConfig,
    recovery: Recovery,
    probe: Arc<dyn ProbeClient>,
    launcher: Arc<ExperimentLauncher>,
    notices: Notices,
    time_provider: Arc<dyn TimeProvider>,
    timers: Timers,
    last_probe: Option<ProbeResult>,
    run_started: i64,
    history: Vec<SupervisorState>,
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        recovery: Recovery,
        probe: Arc<dyn ProbeClient>,
        launcher: Arc<ExperimentLauncher>,
        notices: Notices,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            config,
            recovery,
            probe,
            launcher,
            notices,
            time_provider,
            timers: Timers::default(),
            last_probe: None,
            run_started: 0,
            history: Vec::new(),
        }
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[SupervisorState] {
        &self.history
    }

    /// Drive the state machine until FINISHED, FATAL or shutdown
    pub async fn run(&mut self, mut shutdown: ShutdownToken) -> SupervisorOutcome {
        let now = self.time_provider.now_millis();
        self.run_started = now;
        self.timers = Timers {
            liveness_anchor: now,
            ..Timers::default()
        };
        self.history.clear();

        info!(recovery = self.recovery.label(), "Supervisor started");

        let mut state = SupervisorState::Starting;
        self.history.push(state.clone());

        loop {
            let step = match &state {
                SupervisorState::Starting => self.on_starting(&mut shutdown).await,
                SupervisorState::Checking => Ok(self.on_checking().await),
                SupervisorState::Healthy(progress) => self.on_healthy(progress, &mut shutdown).await,
                SupervisorState::Degraded => self.on_degraded(&mut shutdown).await,
                SupervisorState::Recovering => self.on_recovering(&mut shutdown).await,
                SupervisorState::Finished => {
                    self.notices.finished().await;
                    return SupervisorOutcome::Finished;
                }
                SupervisorState::Fatal(fault) => {
                    self.notices.fatal(fault).await;
                    return SupervisorOutcome::Fatal(fault.clone());
                }
            };

            let next = match step {
                Ok(next) => next,
                Err(Interrupted) => {
                    warn!(state = %state, "Shutdown requested, supervisor stopping");
                    return SupervisorOutcome::Interrupted;
                }
            };

            info!(
                from = %state,
                to = %next,
                consecutive_failures = self.timers.consecutive_failures,
                "State transition"
            );
            self.history.push(next.clone());
            state = next;
        }
    }

    async fn on_starting(&mut self, shutdown: &mut ShutdownToken) -> Step {
        if let Recovery::PowerCycle(relay) = &self.recovery {
            if let Err(fault) = relay.ensure_on().await {
                return Ok(SupervisorState::Fatal(fault.into()));
            }
        }
        if let Err(err) = self.launcher.start().await {
            return Ok(SupervisorState::Fatal(err.into()));
        }

        let delay = self.config.startup_delay;
        self.rearm(delay);
        self.pause(delay, shutdown).await?;
        Ok(SupervisorState::Checking)
    }

    async fn on_checking(&mut self) -> SupervisorState {
        let result = self.probe.check().await;
        self.record_probe(&result);

        match result.status() {
            ProbeStatus::Finished => SupervisorState::Finished,
            ProbeStatus::Running(progress) => SupervisorState::Healthy(progress.to_string()),
            ProbeStatus::Unknown => SupervisorState::Degraded,
        }
    }

    async fn on_healthy(&mut self, progress: &str, shutdown: &mut ShutdownToken) -> Step {
        self.notices.progress(progress).await;

        let wait = self.config.healthy_interval;
        self.rearm(wait);
        self.pause(wait, shutdown).await?;
        Ok(SupervisorState::Checking)
    }

    async fn on_degraded(&mut self, shutdown: &mut ShutdownToken) -> Step {
        if self.timers.consecutive_failures == 1 {
            if let Some(probe) = self.last_probe.clone() {
                self.notices.lost_contact(&probe).await;
            }
        }

        let elapsed = self.outage_elapsed();
        warn!(
            consecutive_failures = self.timers.consecutive_failures,
            outage_secs = elapsed.as_secs(),
            "No usable progress from board"
        );

        if self.timers.outage_failures > self.config.max_consecutive_failures {
            warn!(
                outage_failures = self.timers.outage_failures,
                budget = self.config.max_consecutive_failures,
                "Retry budget exhausted"
            );
            return Ok(SupervisorState::Recovering);
        }

        match self.config.ladder.next(elapsed) {
            Escalation::Retry(wait) => {
                self.pause(wait, shutdown).await?;
                Ok(SupervisorState::Checking)
            }
            Escalation::Recover => Ok(SupervisorState::Recovering),
        }
    }

    async fn on_recovering(&mut self, shutdown: &mut ShutdownToken) -> Step {
        let now = self.time_provider.now_millis();
        let silent_since = self
            .timers
            .last_successful_check
            .unwrap_or(self.run_started);
        self.notices
            .outage(((now - silent_since).max(0) / 60_000) as u64)
            .await;

        let relay = match &self.recovery {
            Recovery::PowerCycle(relay) => Arc::clone(relay),
            Recovery::Relaunch => return self.relaunch(shutdown).await,
        };

        self.notices.rebooting().await;
        if let Err(fault) = relay.power_cycle().await {
            return Ok(SupervisorState::Fatal(fault.into()));
        }
        if let Err(err) = self.launcher.start().await {
            return Ok(SupervisorState::Fatal(err.into()));
        }

        let grace = self.config.grace_period;
        info!(grace_secs = grace.as_secs(), "Board restarted, waiting for boot");
        self.rearm(grace);
        self.pause(grace, shutdown).await?;
        Ok(SupervisorState::Checking)
    }

    /// Relaunch-only recovery: start, wait, probe; bounded by attempts and time
    async fn relaunch(&mut self, shutdown: &mut ShutdownToken) -> Step {
        let policy = self.config.relaunch;
        self.notices.relaunching(policy.max_attempts).await;

        let begin = self.time_provider.now_millis();
        let max_elapsed_ms = policy.max_elapsed.as_millis() as i64;
        let mut attempts = 0;

        loop {
            let elapsed_ms = self.time_provider.now_millis() - begin;
            if attempts >= policy.max_attempts || elapsed_ms >= max_elapsed_ms {
                warn!(attempts = attempts, elapsed_ms = elapsed_ms, "Relaunch attempts exhausted");
                return Ok(SupervisorState::Fatal(
                    LaunchError::RestartExhausted {
                        attempts,
                        minutes: (elapsed_ms / 60_000) as u64,
                    }
                    .into(),
                ));
            }

            attempts += 1;
            self.launcher.attempt_start().await;
            self.pause(policy.retry_interval, shutdown).await?;

            let result = self.probe.check().await;
            self.record_probe(&result);
            match result.status() {
                ProbeStatus::Finished => return Ok(SupervisorState::Finished),
                ProbeStatus::Running(progress) => {
                    info!(attempts = attempts, "Experiment answering again after relaunch");
                    return Ok(SupervisorState::Healthy(progress.to_string()));
                }
                ProbeStatus::Unknown => {
                    debug!(attempts = attempts, "Still no progress after relaunch attempt");
                }
            }
        }
    }

    fn record_probe(&mut self, result: &ProbeResult) {
        if result.is_usable() {
            self.timers.last_successful_check = Some(self.time_provider.now_millis());
            self.timers.consecutive_failures = 0;
            self.timers.outage_failures = 0;
            debug!(probe = %result, "Probe succeeded");
        } else {
            self.timers.consecutive_failures += 1;
            self.timers.outage_failures += 1;
            debug!(probe = %result, "Probe failed");
        }
        self.last_probe = Some(result.clone());
    }

    /// Start measuring outages from `wait` from now
    fn rearm(&mut self, wait: Duration) {
        self.timers.liveness_anchor = self.time_provider.now_millis() + wait.as_millis() as i64;
        self.timers.outage_failures = 0;
    }

    fn outage_elapsed(&self) -> Duration {
        let elapsed = self.time_provider.now_millis() - self.timers.liveness_anchor;
        Duration::from_millis(elapsed.max(0) as u64)
    }

    async fn pause(&self, duration: Duration, shutdown: &mut ShutdownToken) -> Result<(), Interrupted> {
        if shutdown.is_shutdown() {
            return Err(Interrupted);
        }
        debug!(wait_secs = duration.as_secs(), "Waiting");
        tokio::select! {
            _ = self.time_provider.sleep(duration) => Ok(()),
            _ = shutdown.wait() => Err(Interrupted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::launcher::LaunchPolicy;
    use crate::port::experiment_starter::mocks::MockExperimentStarter;
    use crate::port::notifier::mocks::RecordingNotifier;
    use crate::port::probe_client::mocks::MockProbeClient;
    use crate::port::time_provider::mocks::SimulatedTimeProvider;

    fn supervisor(probe: MockProbeClient) -> (Supervisor, Arc<RecordingNotifier>) {
        let clock = Arc::new(SimulatedTimeProvider::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let config = SupervisorConfig::default();
        let launcher = Arc::new(ExperimentLauncher::new(
            Arc::new(MockExperimentStarter::new_success()),
            clock.clone(),
            LaunchPolicy::default(),
        ));
        let notices = Notices::new(notifier.clone(), clock.clone(), config.progress_notify_interval);
        let supervisor = Supervisor::new(
            config,
            Recovery::Relaunch,
            Arc::new(probe),
            launcher,
            notices,
            clock,
        );
        (supervisor, notifier)
    }

    #[test]
    fn test_failure_counter_tracks_latest_probe() {
        let (mut supervisor, _) = supervisor(MockProbeClient::always(ProbeResult::unreachable()));
        let candidates = [
            ProbeResult::unreachable(),
            ProbeResult::no_progress(),
            ProbeResult::from_output("[3/9]"),
            ProbeResult::from_output("   "),
            ProbeResult::from_output("END"),
        ];

        // Deterministic pseudo-random walk over the candidates
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let result = &candidates[(seed >> 33) as usize % candidates.len()];

            supervisor.record_probe(result);

            assert_eq!(
                supervisor.timers().consecutive_failures > 0,
                !result.is_usable(),
                "after {}",
                result
            );
        }
    }

    #[tokio::test]
    async fn test_interrupted_at_first_wait() {
        let (mut supervisor, notifier) =
            supervisor(MockProbeClient::always(ProbeResult::from_output("END")));
        let (tx, token) = shutdown_channel();
        tx.shutdown();

        let outcome = supervisor.run(token).await;

        assert_eq!(outcome, SupervisorOutcome::Interrupted);
        assert_eq!(outcome.exit_code(), 130);
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(SupervisorOutcome::Finished.exit_code(), 0);
        let fault = Fault::Launch(LaunchError::RestartExhausted {
            attempts: 6,
            minutes: 12,
        });
        assert_eq!(SupervisorOutcome::Fatal(fault).exit_code(), 1);
    }
}
