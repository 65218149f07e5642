// Experiment launcher - bounded retry around the remote start command
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::constants::{START_RETRY_CEILING, START_RETRY_INTERVAL};
use crate::domain::LaunchError;
use crate::port::{ExperimentStarter, TimeProvider};

/// Retry window for [`ExperimentLauncher::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchPolicy {
    pub retry_interval: Duration,
    pub ceiling: Duration,
}

impl Default for LaunchPolicy {
    fn default() -> Self {
        Self {
            retry_interval: START_RETRY_INTERVAL,
            ceiling: START_RETRY_CEILING,
        }
    }
}

/// Starts the experiment, tolerating a board that is still booting
pub struct ExperimentLauncher {
    starter: Arc<dyn ExperimentStarter>,
    time_provider: Arc<dyn TimeProvider>,
    policy: LaunchPolicy,
}

impl ExperimentLauncher {
    pub fn new(
        starter: Arc<dyn ExperimentStarter>,
        time_provider: Arc<dyn TimeProvider>,
        policy: LaunchPolicy,
    ) -> Self {
        Self {
            starter,
            time_provider,
            policy,
        }
    }

    /// One start attempt
    pub async fn attempt_start(&self) -> bool {
        info!("Attempting to start experiment");
        let started = self.starter.attempt_start().await;
        if started {
            info!("Experiment started");
        } else {
            warn!("Experiment start attempt failed");
        }
        started
    }

    /// Retry `attempt_start` every `retry_interval` until it succeeds or
    /// `ceiling` has elapsed
    pub async fn start(&self) -> Result<(), LaunchError> {
        let begin = self.time_provider.now_millis();
        let ceiling_ms = self.policy.ceiling.as_millis() as i64;
        let mut attempts = 0;

        while self.time_provider.now_millis() - begin < ceiling_ms {
            attempts += 1;
            if self.attempt_start().await {
                return Ok(());
            }
            self.time_provider.sleep(self.policy.retry_interval).await;
        }

        warn!(
            attempts = %attempts,
            ceiling_secs = %self.policy.ceiling.as_secs(),
            "Giving up on starting the experiment"
        );
        Err(LaunchError::StartTimedOut {
            attempts,
            minutes: self.policy.ceiling.as_secs() / 60,
        })
    }
}
