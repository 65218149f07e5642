// Notifier Port
// Best-effort outbound messages to the operator
use async_trait::async_trait;

/// Fire-and-forget notification channel
///
/// `send` never fails the caller: delivery errors are logged and dropped,
/// and a notifier without credentials does nothing.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every message instead of sending it
    #[derive(Default)]
    pub struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        pub fn count_containing(&self, needle: &str) -> usize {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.contains(needle))
                .count()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }
}
