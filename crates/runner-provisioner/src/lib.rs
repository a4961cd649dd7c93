// runner-provisioner: turns credentials into a registration token and drives
// the runner toolchain through exactly one unregister → register → run cycle.
//
// Architecture:
//   main → RunnerSettings::from_env → scrub_environment → provision
//   provision → credentials::resolve → registration::acquire → RunnerLifecycle::execute

pub mod api;
pub mod credentials;
pub mod error;
pub mod orchestrator;
pub mod provisioner;
pub mod registration;

pub use error::{LifecycleStage, ProvisionError};
pub use provisioner::{provision, provision_with};
