// provisioner-common: Shared services for the runner provisioner.
// Depends on `provisioner-sdk`; knows nothing about GitHub or the runner lifecycle.

pub mod constants;
pub mod environment;
pub mod http_client_factory;
pub mod secret_masker;
pub mod settings;
pub mod tracing;

// ---------------------------------------------------------------------------
// Re-exports for convenient access
// ---------------------------------------------------------------------------

pub use environment::scrub_environment;
pub use http_client_factory::HttpClientFactory;
pub use secret_masker::SecretMasker;
pub use settings::{RunnerIdentity, RunnerSettings, SettingsError};
pub use crate::tracing::{TraceManager, Tracing};
