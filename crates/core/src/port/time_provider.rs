// Time Provider Port (for testability)
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Clock and timer used by every wait in the watchdog
///
/// Injected so that tests can simulate hours of outage without sleeping.
#[async_trait]
pub trait TimeProvider: Send + Sync {
    /// Monotonic milliseconds since an arbitrary origin
    fn now_millis(&self) -> i64;

    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Monotonic time provider (production)
pub struct SystemTimeProvider {
    origin: Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// Simulated clock: `sleep` advances time instantly and is recorded
    pub struct SimulatedTimeProvider {
        now: AtomicI64,
        sleeps: Mutex<Vec<Duration>>,
    }

    impl SimulatedTimeProvider {
        pub fn new() -> Self {
            Self {
                now: AtomicI64::new(0),
                sleeps: Mutex::new(Vec::new()),
            }
        }

        pub fn advance(&self, duration: Duration) {
            self.now
                .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
        }

        /// Every duration passed to `sleep`, in call order
        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }

        pub fn now_minutes(&self) -> f64 {
            self.now_millis() as f64 / 60_000.0
        }
    }

    impl Default for SimulatedTimeProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl TimeProvider for SimulatedTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }

        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            self.advance(duration);
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::SimulatedTimeProvider;
    use super::*;

    #[tokio::test]
    async fn test_simulated_sleep_advances_clock() {
        let clock = SimulatedTimeProvider::new();
        clock.sleep(Duration::from_secs(90)).await;
        clock.sleep(Duration::from_millis(500)).await;

        assert_eq!(clock.now_millis(), 90_500);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(90), Duration::from_millis(500)]
        );
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemTimeProvider::new();
        let first = clock.now_millis();
        let second = clock.now_millis();
        assert!(second >= first);
    }
}
