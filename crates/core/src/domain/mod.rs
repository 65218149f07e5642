// Domain Layer - Plain data and fault taxonomy

pub mod fault;
pub mod probe;
pub mod relay;
pub mod state;

// Re-exports
pub use fault::{Fault, LaunchError, RelayFault};
pub use probe::{ProbeResult, ProbeStatus, END_TOKEN};
pub use relay::RelayState;
pub use state::SupervisorState;
