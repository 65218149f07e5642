// Supervisor configuration
use std::time::Duration;

use super::constants::*;
use super::escalation::EscalationLadder;
use super::launcher::LaunchPolicy;
use super::supervisor::RelaunchPolicy;
use crate::error::{Result, WatchdogError};

/// Timing and budget knobs of the supervisor loop
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub startup_delay: Duration,
    pub healthy_interval: Duration,
    pub progress_notify_interval: Duration,
    pub grace_period: Duration,
    pub max_consecutive_failures: u32,
    pub ladder: EscalationLadder,
    pub launch: LaunchPolicy,
    pub relaunch: RelaunchPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            startup_delay: STARTUP_DELAY,
            healthy_interval: HEALTHY_CHECK_INTERVAL,
            progress_notify_interval: PROGRESS_NOTIFY_INTERVAL,
            grace_period: RECOVERY_GRACE_PERIOD,
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
            ladder: EscalationLadder::default(),
            launch: LaunchPolicy::default(),
            relaunch: RelaunchPolicy::default(),
        }
    }
}

impl SupervisorConfig {
    /// Reject configurations the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.healthy_interval.is_zero() {
            return Err(WatchdogError::Config(
                "healthy interval must be positive".to_string(),
            ));
        }
        if self.max_consecutive_failures == 0 {
            return Err(WatchdogError::Config(
                "failure budget must allow at least one failed probe".to_string(),
            ));
        }
        if self.launch.retry_interval.is_zero() || self.launch.ceiling.is_zero() {
            return Err(WatchdogError::Config(
                "start retry interval and ceiling must be positive".to_string(),
            ));
        }
        if self.relaunch.max_attempts == 0 {
            return Err(WatchdogError::Config(
                "relaunch recovery needs at least one attempt".to_string(),
            ));
        }
        if self.relaunch.retry_interval.is_zero() || self.relaunch.max_elapsed.is_zero() {
            return Err(WatchdogError::Config(
                "relaunch retry interval and time limit must be positive".to_string(),
            ));
        }
        EscalationLadder::new(self.ladder.steps().to_vec(), self.ladder.recover_after())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        tokio_test::assert_ok!(SupervisorConfig::default().validate());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = SupervisorConfig {
            max_consecutive_failures: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("failure budget"));
    }

    #[test]
    fn test_zero_relaunch_attempts_rejected() {
        let mut config = SupervisorConfig::default();
        config.relaunch.max_attempts = 0;
        tokio_test::assert_err!(config.validate());
    }

    #[test]
    fn test_zero_relaunch_window_rejected() {
        let mut config = SupervisorConfig::default();
        config.relaunch.max_elapsed = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("time limit"));

        let mut config = SupervisorConfig::default();
        config.relaunch.retry_interval = Duration::ZERO;
        tokio_test::assert_err!(config.validate());
    }
}
