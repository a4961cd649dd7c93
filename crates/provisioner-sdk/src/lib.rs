// provisioner-sdk: Foundation layer for the runner provisioner.
// This crate has no dependencies on other provisioner crates and provides
// the trace abstraction and the cancellable child-process invoker.

pub mod build_constants;
pub mod process_invoker;
pub mod trace;

// Re-export commonly used items at crate root
pub use build_constants::{ProvisionerPackage, Source};
pub use process_invoker::{ProcessError, ProcessInvoker};
pub use trace::TraceWriter;
