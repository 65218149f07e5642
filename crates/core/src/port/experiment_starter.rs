// Experiment Starter Port
// A single invocation of the remote start command
use async_trait::async_trait;

#[async_trait]
pub trait ExperimentStarter: Send + Sync {
    /// Invoke the remote start command once
    ///
    /// Returns true when the command reports that the experiment process
    /// was launched (not that it is already running).
    async fn attempt_start(&self) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock starter replaying scripted outcomes, then a fallback
    pub struct MockExperimentStarter {
        outcomes: Mutex<VecDeque<bool>>,
        fallback: bool,
        call_count: Mutex<usize>,
    }

    impl MockExperimentStarter {
        pub fn new(outcomes: Vec<bool>, fallback: bool) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                fallback,
                call_count: Mutex::new(0),
            }
        }

        pub fn new_success() -> Self {
            Self::new(Vec::new(), true)
        }

        pub fn new_fail() -> Self {
            Self::new(Vec::new(), false)
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl ExperimentStarter for MockExperimentStarter {
        async fn attempt_start(&self) -> bool {
            *self.call_count.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.fallback)
        }
    }
}
