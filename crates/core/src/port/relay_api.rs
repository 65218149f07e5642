// Relay API Port
// Raw transport to the network power relay
use async_trait::async_trait;

/// Relay transport interface
///
/// Both calls return `None` when the relay could not be asked or gave an
/// unusable answer (non-2xx, malformed JSON, timeout).
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Configured device name (`GET /settings` → `name`)
    async fn device_name(&self) -> Option<String>;

    /// Switch the relay (`Some(on)`) or only read it (`None`), returning
    /// the reported position (`GET /relay/0[?turn=on|off]` → `ison`)
    async fn switch(&self, turn: Option<bool>) -> Option<bool>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// One call observed by the mock relay
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RelayCall {
        Identity,
        Read,
        Switch(bool),
    }

    struct MockRelayInner {
        name: Option<String>,
        is_on: bool,
        /// Position the relay refuses to leave, if any
        stuck: Option<bool>,
        calls: Vec<RelayCall>,
    }

    /// In-memory relay recording every call
    pub struct MockRelayApi {
        inner: Mutex<MockRelayInner>,
    }

    impl MockRelayApi {
        pub fn new(name: impl Into<String>, is_on: bool) -> Self {
            Self {
                inner: Mutex::new(MockRelayInner {
                    name: Some(name.into()),
                    is_on,
                    stuck: None,
                    calls: Vec::new(),
                }),
            }
        }

        /// Relay that never answers
        pub fn unreachable() -> Self {
            let relay = Self::new("", false);
            relay.inner.lock().unwrap().name = None;
            relay
        }

        pub fn set_name(&self, name: Option<&str>) {
            self.inner.lock().unwrap().name = name.map(str::to_string);
        }

        pub fn set_stuck(&self, position: Option<bool>) {
            let mut inner = self.inner.lock().unwrap();
            inner.stuck = position;
            if let Some(on) = position {
                inner.is_on = on;
            }
        }

        pub fn is_on(&self) -> bool {
            self.inner.lock().unwrap().is_on
        }

        pub fn calls(&self) -> Vec<RelayCall> {
            self.inner.lock().unwrap().calls.clone()
        }

        pub fn switch_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, RelayCall::Switch(_)))
                .count()
        }

        /// Number of completed off→on sequences
        pub fn power_cycles(&self) -> usize {
            self.calls()
                .windows(2)
                .filter(|w| w[0] == RelayCall::Switch(false) && w[1] == RelayCall::Switch(true))
                .count()
        }
    }

    #[async_trait]
    impl RelayApi for MockRelayApi {
        async fn device_name(&self) -> Option<String> {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(RelayCall::Identity);
            inner.name.clone()
        }

        async fn switch(&self, turn: Option<bool>) -> Option<bool> {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(match turn {
                Some(on) => RelayCall::Switch(on),
                None => RelayCall::Read,
            });
            inner.name.as_ref()?;
            if let (Some(on), None) = (turn, inner.stuck) {
                inner.is_on = on;
            }
            Some(inner.is_on)
        }
    }
}
