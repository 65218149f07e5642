// Supervisor defaults (no magic values in the state machine)
use std::time::Duration;

const fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

/// Wait after a successful launch before the first probe (20s)
pub const STARTUP_DELAY: Duration = Duration::from_secs(20);

/// Wait between probes while the experiment is healthy (10 min)
pub const HEALTHY_CHECK_INTERVAL: Duration = minutes(10);

/// Minimum spacing of progress notifications (10 min)
pub const PROGRESS_NOTIFY_INTERVAL: Duration = minutes(10);

/// Escalation ladder: (outage shorter than, wait before next probe)
pub const LADDER_STEPS: [(Duration, Duration); 3] = [
    (minutes(5), minutes(4)),
    (minutes(7), minutes(1)),
    (minutes(10), Duration::from_secs(30)),
];

/// Outage length that triggers recovery (10 min)
pub const RECOVER_AFTER: Duration = minutes(10);

/// Failed probes within one outage before recovery is forced
pub const MAX_CONSECUTIVE_FAILURES: u32 = 12;

/// Wait after a power-cycle + relaunch before probing again (20 min)
pub const RECOVERY_GRACE_PERIOD: Duration = minutes(20);

/// Interval between remote start attempts (30s)
pub const START_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Give up starting the experiment after this long (10 min)
pub const START_RETRY_CEILING: Duration = minutes(10);

/// Time the board is left unpowered during a power-cycle (10s)
pub const RELAY_SETTLE_DELAY: Duration = Duration::from_secs(10);

/// Relaunch-only recovery: maximum start attempts
pub const RELAUNCH_MAX_ATTEMPTS: u32 = 6;

/// Relaunch-only recovery: maximum time spent relaunching (20 min)
pub const RELAUNCH_MAX_ELAPSED: Duration = minutes(20);

/// Relaunch-only recovery: wait between a start attempt and its probe (2 min)
pub const RELAUNCH_RETRY_INTERVAL: Duration = minutes(2);
