// Operator notices - message catalogue, logging and progress rate limiting
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::domain::{Fault, ProbeResult};
use crate::port::{Notifier, TimeProvider};

pub const FINISHED_MESSAGE: &str = "Experiments finished!!";
pub const REBOOT_MESSAGE: &str = "Power-cycling board through relay";
pub const STUCK_MESSAGE: &str = "Power Meter is stuck!!";
/// Manual reboot announcement; the operator restarts the experiment
pub const MANUAL_REBOOT_MESSAGE: &str = "Performing reboot, please re-start experiment!!";

pub fn progress_message(progress: &str) -> String {
    format!("Current experiment progress {}", progress)
}

/// `Power Meter is <words>`, or the stock stuck notice without words
pub fn stuck_message(words: &[String]) -> String {
    if words.is_empty() {
        STUCK_MESSAGE.to_string()
    } else {
        format!("Power Meter is {}", words.join(" "))
    }
}

pub fn outage_message(minutes: u64) -> String {
    format!("No response for {} minutes!", minutes)
}

pub fn fatal_message(fault: &Fault) -> String {
    format!("{}: {}", fault.kind(), fault)
}

pub fn lost_contact_message(probe: &ProbeResult) -> String {
    if probe.reachable {
        "Lost contact with experiment: progress check failed".to_string()
    } else {
        "Lost contact with board: ping failed".to_string()
    }
}

pub fn relaunch_message(max_attempts: u32) -> String {
    format!(
        "Restarting experiment without power control (up to {} attempts)",
        max_attempts
    )
}

/// Sends operator notices through a [`Notifier`], logging each one
///
/// Progress notices are rate limited; every other notice is sent as is.
pub struct Notices {
    notifier: Arc<dyn Notifier>,
    time_provider: Arc<dyn TimeProvider>,
    progress_interval: Duration,
    last_progress_at: Option<i64>,
}

impl Notices {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        time_provider: Arc<dyn TimeProvider>,
        progress_interval: Duration,
    ) -> Self {
        Self {
            notifier,
            time_provider,
            progress_interval,
            last_progress_at: None,
        }
    }

    /// Report progress unless one was reported less than an interval ago
    ///
    /// Returns true if the notice went out.
    pub async fn progress(&mut self, progress: &str) -> bool {
        let now = self.time_provider.now_millis();
        let interval_ms = self.progress_interval.as_millis() as i64;
        if let Some(last) = self.last_progress_at {
            if now - last < interval_ms {
                info!(progress = %progress, "Experiment progress (notice suppressed)");
                return false;
            }
        }
        self.last_progress_at = Some(now);

        let message = progress_message(progress);
        info!("{}", message);
        self.notifier.send(&message).await;
        true
    }

    pub async fn finished(&self) {
        info!("{}", FINISHED_MESSAGE);
        self.notifier.send(FINISHED_MESSAGE).await;
    }

    pub async fn lost_contact(&self, probe: &ProbeResult) {
        let message = lost_contact_message(probe);
        warn!("{}", message);
        self.notifier.send(&message).await;
    }

    pub async fn outage(&self, minutes: u64) {
        let message = outage_message(minutes);
        error!("{}", message);
        self.notifier.send(&message).await;
    }

    pub async fn rebooting(&self) {
        warn!("{}", REBOOT_MESSAGE);
        self.notifier.send(REBOOT_MESSAGE).await;
    }

    pub async fn relaunching(&self, max_attempts: u32) {
        let message = relaunch_message(max_attempts);
        warn!("{}", message);
        self.notifier.send(&message).await;
    }

    pub async fn fatal(&self, fault: &Fault) {
        let message = fatal_message(fault);
        error!("{}", message);
        self.notifier.send(&message).await;
    }

    /// Free-form notice (operator tooling)
    pub async fn text(&self, message: &str) {
        info!("{}", message);
        self.notifier.send(message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RelayFault;
    use crate::port::notifier::mocks::RecordingNotifier;
    use crate::port::time_provider::mocks::SimulatedTimeProvider;

    fn notices() -> (Notices, Arc<RecordingNotifier>, Arc<SimulatedTimeProvider>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(SimulatedTimeProvider::new());
        let notices = Notices::new(notifier.clone(), clock.clone(), Duration::from_secs(600));
        (notices, notifier, clock)
    }

    #[tokio::test]
    async fn test_progress_rate_limited() {
        let (mut notices, notifier, clock) = notices();

        assert!(notices.progress("[1/10]").await);
        clock.advance(Duration::from_secs(60));
        assert!(!notices.progress("[2/10]").await);
        clock.advance(Duration::from_secs(540));
        assert!(notices.progress("[3/10]").await);

        assert_eq!(
            notifier.messages(),
            vec![
                "Current experiment progress [1/10]".to_string(),
                "Current experiment progress [3/10]".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_fatal_names_fault_kind() {
        let (notices, notifier, _) = notices();
        let fault = Fault::Relay(RelayFault::identity_mismatch("Zarquon", None));

        notices.fatal(&fault).await;

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("RelayFault: identity mismatch"));
    }

    #[test]
    fn test_stuck_message() {
        assert_eq!(stuck_message(&[]), "Power Meter is stuck!!");
        let words = vec!["off".to_string(), "by".to_string(), "10W".to_string()];
        assert_eq!(stuck_message(&words), "Power Meter is off by 10W");
    }

    #[test]
    fn test_lost_contact_wording() {
        assert!(lost_contact_message(&ProbeResult::unreachable()).contains("ping failed"));
        assert!(lost_contact_message(&ProbeResult::no_progress()).contains("progress check"));
    }
}
