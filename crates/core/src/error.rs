// Central Error Type for the library crates

use thiserror::Error;

/// Library-level error type
///
/// Transport failures never show up here: they are absorbed by the
/// adapters and surfaced as data. Faults that end a run are not errors
/// either; they live in [`crate::domain::Fault`].
#[derive(Error, Debug)]
pub enum WatchdogError {
    /// Supervisor settings the loop cannot run with
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed escalation ladder
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using WatchdogError
pub type Result<T> = std::result::Result<T, WatchdogError>;
