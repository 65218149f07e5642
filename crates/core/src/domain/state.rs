// Supervisor State Machine states

use super::fault::Fault;

/// State of a supervision run
///
/// Owned and mutated only by the supervisor loop; dropped when it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Checking,
    /// Last probe returned this progress token
    Healthy(String),
    Degraded,
    Recovering,
    Finished,
    Fatal(Fault),
}

impl SupervisorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorState::Finished | SupervisorState::Fatal(_))
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorState::Starting => write!(f, "STARTING"),
            SupervisorState::Checking => write!(f, "CHECKING"),
            SupervisorState::Healthy(_) => write!(f, "HEALTHY"),
            SupervisorState::Degraded => write!(f, "DEGRADED"),
            SupervisorState::Recovering => write!(f, "RECOVERING"),
            SupervisorState::Finished => write!(f, "FINISHED"),
            SupervisorState::Fatal(_) => write!(f, "FATAL"),
        }
    }
}
