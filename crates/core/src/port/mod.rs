// Port Layer - Interfaces for external collaborators

pub mod experiment_starter;
pub mod notifier;
pub mod probe_client;
pub mod relay_api;
pub mod time_provider; // For simulated time in tests

// Re-exports
pub use experiment_starter::ExperimentStarter;
pub use notifier::Notifier;
pub use probe_client::ProbeClient;
pub use relay_api::RelayApi;
pub use time_provider::TimeProvider;
