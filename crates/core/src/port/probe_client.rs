// Probe Client Port
// Reachability + progress check against the remote board
use crate::domain::ProbeResult;
use async_trait::async_trait;

/// Probe client interface
///
/// Implementations absorb every transport failure: the caller only ever
/// sees a [`ProbeResult`].
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Ping the board and, if it answers, query the experiment progress
    async fn check(&self) -> ProbeResult;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type ProbeScript = Box<dyn Fn(usize) -> ProbeResult + Send + Sync>;

    /// Mock probe driven by a script indexed by call number (0-based)
    pub struct MockProbeClient {
        script: ProbeScript,
        call_count: AtomicUsize,
    }

    impl MockProbeClient {
        pub fn from_fn(script: impl Fn(usize) -> ProbeResult + Send + Sync + 'static) -> Self {
            Self {
                script: Box::new(script),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Return `results` in order, then `fallback` forever
        pub fn sequence(results: Vec<ProbeResult>, fallback: ProbeResult) -> Self {
            Self::from_fn(move |call| results.get(call).cloned().unwrap_or_else(|| fallback.clone()))
        }

        pub fn always(result: ProbeResult) -> Self {
            Self::sequence(Vec::new(), result)
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProbeClient for MockProbeClient {
        async fn check(&self) -> ProbeResult {
            let call = self.call_count.fetch_add(1, Ordering::SeqCst);
            (self.script)(call)
        }
    }
}
