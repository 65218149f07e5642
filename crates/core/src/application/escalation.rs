//! Escalation ladder
//!
//! Maps the length of an outage to the wait before the next probe. The
//! ladder shortens the wait as the outage grows, so a transient blip costs
//! one slow retry while a real outage reaches recovery within a bounded
//! window. Pure data: no clock, no sleeping.

use std::time::Duration;

use super::constants::{LADDER_STEPS, RECOVER_AFTER};
use crate::error::{Result, WatchdogError};

/// One rung: while the outage is shorter than `below`, wait `wait`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LadderStep {
    pub below: Duration,
    pub wait: Duration,
}

/// Decision for a failed probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Probe again after this delay
    Retry(Duration),
    /// Stop retrying and recover the board
    Recover,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationLadder {
    steps: Vec<LadderStep>,
    recover_after: Duration,
}

impl EscalationLadder {
    /// Build a validated ladder
    ///
    /// Steps must be ordered by strictly increasing `below`, waits must be
    /// positive and never grow, and the last step may not extend past
    /// `recover_after`.
    pub fn new(steps: Vec<LadderStep>, recover_after: Duration) -> Result<Self> {
        let Some(last) = steps.last() else {
            return Err(WatchdogError::Validation(
                "escalation ladder needs at least one step".to_string(),
            ));
        };
        if last.below > recover_after {
            return Err(WatchdogError::Validation(format!(
                "ladder step below {:?} extends past recovery threshold {:?}",
                last.below, recover_after
            )));
        }
        if steps.iter().any(|s| s.wait.is_zero()) {
            return Err(WatchdogError::Validation(
                "ladder waits must be positive".to_string(),
            ));
        }
        for pair in steps.windows(2) {
            if pair[1].below <= pair[0].below {
                return Err(WatchdogError::Validation(
                    "ladder thresholds must be strictly increasing".to_string(),
                ));
            }
            if pair[1].wait > pair[0].wait {
                return Err(WatchdogError::Validation(format!(
                    "ladder wait grows from {:?} to {:?}",
                    pair[0].wait, pair[1].wait
                )));
            }
        }
        Ok(Self {
            steps,
            recover_after,
        })
    }

    pub fn steps(&self) -> &[LadderStep] {
        &self.steps
    }

    pub fn recover_after(&self) -> Duration {
        self.recover_after
    }

    /// Decide what to do after a failed probe, `elapsed` into the outage
    pub fn next(&self, elapsed: Duration) -> Escalation {
        if elapsed >= self.recover_after {
            return Escalation::Recover;
        }
        let wait = self
            .steps
            .iter()
            .find(|step| elapsed < step.below)
            .or(self.steps.last())
            .map(|step| step.wait)
            .unwrap_or(self.recover_after);
        Escalation::Retry(wait)
    }
}

impl Default for EscalationLadder {
    fn default() -> Self {
        Self {
            steps: LADDER_STEPS
                .iter()
                .map(|&(below, wait)| LadderStep { below, wait })
                .collect(),
            recover_after: RECOVER_AFTER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mins(m: f64) -> Duration {
        Duration::from_secs_f64(m * 60.0)
    }

    fn wait_for(ladder: &EscalationLadder, elapsed: Duration) -> Duration {
        match ladder.next(elapsed) {
            Escalation::Retry(wait) => wait,
            Escalation::Recover => panic!("unexpected recovery at {:?}", elapsed),
        }
    }

    #[test]
    fn test_default_ladder_rungs() {
        let ladder = EscalationLadder::default();

        assert_eq!(wait_for(&ladder, mins(0.0)), mins(4.0));
        assert_eq!(wait_for(&ladder, mins(4.9)), mins(4.0));
        assert_eq!(wait_for(&ladder, mins(5.0)), mins(1.0));
        assert_eq!(wait_for(&ladder, mins(6.5)), mins(1.0));
        assert_eq!(wait_for(&ladder, mins(7.0)), Duration::from_secs(30));
        assert_eq!(wait_for(&ladder, mins(9.9)), Duration::from_secs(30));
        assert_eq!(ladder.next(mins(10.0)), Escalation::Recover);
        assert_eq!(ladder.next(mins(45.0)), Escalation::Recover);
    }

    #[test]
    fn test_waits_never_grow_with_outage() {
        let ladder = EscalationLadder::default();
        let mut previous = Duration::MAX;

        // Sample every 10 seconds up to the recovery threshold
        for tick in 0..60 {
            let elapsed = Duration::from_secs(tick * 10);
            let wait = wait_for(&ladder, elapsed);
            assert!(wait <= previous, "wait grew at {:?}", elapsed);
            previous = wait;
        }
    }

    #[test]
    fn test_gap_before_recovery_uses_last_rung() {
        let ladder = EscalationLadder::new(
            vec![LadderStep {
                below: mins(2.0),
                wait: mins(1.0),
            }],
            mins(6.0),
        )
        .unwrap();

        assert_eq!(ladder.next(mins(3.0)), Escalation::Retry(mins(1.0)));
        assert_eq!(ladder.next(mins(6.0)), Escalation::Recover);
    }

    #[test]
    fn test_rejects_growing_wait() {
        let result = EscalationLadder::new(
            vec![
                LadderStep {
                    below: mins(5.0),
                    wait: mins(1.0),
                },
                LadderStep {
                    below: mins(7.0),
                    wait: mins(2.0),
                },
            ],
            mins(10.0),
        );

        let err = result.unwrap_err();
        assert!(err.to_string().contains("grows"));
    }

    #[test]
    fn test_rejects_empty_and_unordered() {
        assert!(EscalationLadder::new(Vec::new(), mins(10.0)).is_err());

        let unordered = EscalationLadder::new(
            vec![
                LadderStep {
                    below: mins(7.0),
                    wait: mins(1.0),
                },
                LadderStep {
                    below: mins(5.0),
                    wait: mins(1.0),
                },
            ],
            mins(10.0),
        );
        assert!(unordered.is_err());
    }

    #[test]
    fn test_rejects_step_past_recovery() {
        let result = EscalationLadder::new(
            vec![LadderStep {
                below: mins(12.0),
                wait: mins(1.0),
            }],
            mins(10.0),
        );
        assert!(result.is_err());
    }
}
