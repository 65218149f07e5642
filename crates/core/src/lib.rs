// Watchdog Core - Domain Logic, Ports & Supervisor
// NO infrastructure dependencies: processes, HTTP and config files live in
// the infra crates and the daemon.

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{Result, WatchdogError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
