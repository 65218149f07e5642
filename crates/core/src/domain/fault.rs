// Fault taxonomy for conditions that end a run

use thiserror::Error;

/// The relay could not be trusted or did not confirm a requested position
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayFault {
    #[error("identity mismatch (expected '{expected}', found {found})")]
    IdentityMismatch { expected: String, found: String },

    #[error("did not turn off")]
    DidNotTurnOff,

    #[error("did not turn on")]
    DidNotTurnOn,
}

impl RelayFault {
    pub fn identity_mismatch(expected: &str, found: Option<&str>) -> Self {
        RelayFault::IdentityMismatch {
            expected: expected.to_string(),
            found: found
                .map(|name| format!("'{}'", name))
                .unwrap_or_else(|| "no answer".to_string()),
        }
    }
}

/// The experiment could not be (re)started within its bounded window
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("could not start experiment for {minutes} minutes ({attempts} attempts)")]
    StartTimedOut { attempts: u32, minutes: u64 },

    #[error("could not restart experiment after {attempts} attempts in {minutes} minutes")]
    RestartExhausted { attempts: u32, minutes: u64 },
}

/// Terminal fault, switched on by the supervisor instead of unwinding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error(transparent)]
    Relay(#[from] RelayFault),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl Fault {
    /// Fault kind as shown to the operator
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::Relay(_) => "RelayFault",
            Fault::Launch(_) => "LaunchError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mismatch_message() {
        let fault = RelayFault::identity_mismatch("Zarquon", Some("Other"));
        assert_eq!(
            fault.to_string(),
            "identity mismatch (expected 'Zarquon', found 'Other')"
        );

        let silent = RelayFault::identity_mismatch("Zarquon", None);
        assert!(silent.to_string().contains("no answer"));
    }

    #[test]
    fn test_fault_kind() {
        let relay: Fault = RelayFault::DidNotTurnOn.into();
        assert_eq!(relay.kind(), "RelayFault");
        assert_eq!(relay.to_string(), "did not turn on");

        let launch: Fault = LaunchError::StartTimedOut {
            attempts: 20,
            minutes: 10,
        }
        .into();
        assert_eq!(launch.kind(), "LaunchError");
    }
}
