// Probe result model

use serde::{Deserialize, Serialize};

/// Progress token reported by the remote probe once the campaign is over
pub const END_TOKEN: &str = "END";

/// Outcome of one reachability + progress check
///
/// `progress` is opaque: the watchdog only distinguishes [`END_TOKEN`],
/// any other token, and no token at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub reachable: bool,
    pub progress: Option<String>,
}

/// Classification of a probe result as seen by the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus<'a> {
    /// The experiment reported completion
    Finished,
    /// The experiment is alive and reported this status line
    Running(&'a str),
    /// Board unreachable, remote command failed, or empty output
    Unknown,
}

impl ProbeResult {
    /// Ping failed; the remote command was not attempted
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            progress: None,
        }
    }

    /// Ping answered but the remote command did not yield a token
    pub fn no_progress() -> Self {
        Self {
            reachable: true,
            progress: None,
        }
    }

    /// Build a result from raw command stdout
    ///
    /// Output is trimmed; whitespace-only output carries no token.
    pub fn from_output(stdout: &str) -> Self {
        let token = stdout.trim();
        Self {
            reachable: true,
            progress: (!token.is_empty()).then(|| token.to_string()),
        }
    }

    pub fn status(&self) -> ProbeStatus<'_> {
        match self.progress.as_deref() {
            Some(END_TOKEN) => ProbeStatus::Finished,
            Some(token) if !token.is_empty() => ProbeStatus::Running(token),
            _ => ProbeStatus::Unknown,
        }
    }

    /// True when the probe produced a token the supervisor can act on
    pub fn is_usable(&self) -> bool {
        !matches!(self.status(), ProbeStatus::Unknown)
    }
}

impl std::fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.reachable, self.progress.as_deref()) {
            (false, _) => write!(f, "unreachable"),
            (true, None) => write!(f, "reachable, no progress"),
            (true, Some(token)) => write!(f, "reachable, progress {}", token),
        }
    }
}
