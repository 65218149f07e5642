// Relay controller - guarded power actions on the board's relay
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::constants::RELAY_SETTLE_DELAY;
use crate::domain::{RelayFault, RelayState};
use crate::port::{RelayApi, TimeProvider};

/// Relay controller
///
/// Every answer the relay cannot give is read as "off / failed": a false
/// "on" could skip a needed power-cycle, a false "off" only costs a retry.
/// Power actions go through [`RelayController::switch_verified`] or
/// [`RelayController::power_cycle`], which confirm the relay identity
/// immediately before touching the switch.
pub struct RelayController {
    api: Arc<dyn RelayApi>,
    time_provider: Arc<dyn TimeProvider>,
    expected_name: String,
    settle_delay: Duration,
}

impl RelayController {
    /// Create a relay controller
    ///
    /// # Arguments
    /// * `api` - Relay transport
    /// * `time_provider` - Clock used for the settle delay
    /// * `expected_name` - Device name the relay must report
    pub fn new(
        api: Arc<dyn RelayApi>,
        time_provider: Arc<dyn TimeProvider>,
        expected_name: impl Into<String>,
    ) -> Self {
        Self {
            api,
            time_provider,
            expected_name: expected_name.into(),
            settle_delay: RELAY_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn expected_name(&self) -> &str {
        &self.expected_name
    }

    /// True only if the relay answered with the expected name
    pub async fn verify_identity(&self) -> bool {
        self.check_identity().await.is_ok()
    }

    /// Request a position and return the position the relay reports
    ///
    /// Does not verify identity; callers that act on the board use
    /// [`RelayController::switch_verified`].
    pub async fn set_state(&self, on: bool) -> bool {
        self.api.switch(Some(on)).await.unwrap_or(false)
    }

    /// Current reported position (false when unknown)
    pub async fn read_state(&self) -> bool {
        self.api.switch(None).await.unwrap_or(false)
    }

    /// Name and position, or None if either could not be read
    pub async fn status(&self) -> Option<RelayState> {
        let name = self.api.device_name().await?;
        let is_on = self.api.switch(None).await?;
        Some(RelayState { name, is_on })
    }

    /// Verify identity, then switch; returns the reported position
    pub async fn switch_verified(&self, on: bool) -> Result<bool, RelayFault> {
        self.check_identity().await?;
        Ok(self.set_state(on).await)
    }

    /// Make sure the board is powered
    pub async fn ensure_on(&self) -> Result<(), RelayFault> {
        if !self.switch_verified(true).await? {
            return Err(RelayFault::DidNotTurnOn);
        }
        info!(relay = %self.expected_name, "Relay is on");
        Ok(())
    }

    /// Hard-reboot the board: verify identity, off, settle, on
    ///
    /// Safe to re-run from scratch after an interruption at any step:
    /// switching off when off, or on when on, is harmless.
    pub async fn power_cycle(&self) -> Result<(), RelayFault> {
        self.check_identity().await?;

        info!(relay = %self.expected_name, "Power-cycling board: switching off");
        if self.set_state(false).await {
            warn!(relay = %self.expected_name, "Relay still reports on");
            return Err(RelayFault::DidNotTurnOff);
        }

        self.time_provider.sleep(self.settle_delay).await;

        info!(relay = %self.expected_name, "Power-cycling board: switching on");
        if !self.set_state(true).await {
            warn!(relay = %self.expected_name, "Relay still reports off");
            return Err(RelayFault::DidNotTurnOn);
        }

        info!(relay = %self.expected_name, "Power-cycle complete");
        Ok(())
    }

    async fn check_identity(&self) -> Result<(), RelayFault> {
        let name = self.api.device_name().await;
        if name.as_deref() == Some(self.expected_name.as_str()) {
            return Ok(());
        }
        warn!(
            expected = %self.expected_name,
            found = ?name,
            "Relay identity could not be confirmed"
        );
        Err(RelayFault::identity_mismatch(
            &self.expected_name,
            name.as_deref(),
        ))
    }
}
