// Named trace sources that mask secrets before handing lines to `tracing`.

use crate::secret_masker::SecretMasker;
use provisioner_sdk::TraceWriter;
use std::sync::Arc;

/// A trace source that masks secrets before emitting log lines.
///
/// Every component gets its own `Tracing` with a name used as the `source`
/// field; all of them share one `SecretMasker`.
#[derive(Clone)]
pub struct Tracing {
    name: String,
    secret_masker: SecretMasker,
}

impl Tracing {
    pub fn new(name: impl Into<String>, secret_masker: SecretMasker) -> Self {
        Self {
            name: name.into(),
            secret_masker,
        }
    }
}

impl TraceWriter for Tracing {
    fn info(&self, message: &str) {
        let masked = self.secret_masker.mask_secrets(message);
        tracing::info!(source = %self.name, "{}", masked);
    }

    fn verbose(&self, message: &str) {
        let masked = self.secret_masker.mask_secrets(message);
        tracing::debug!(source = %self.name, "{}", masked);
    }

    fn warning(&self, message: &str) {
        let masked = self.secret_masker.mask_secrets(message);
        tracing::warn!(source = %self.name, "{}", masked);
    }
}

/// Hands out named trace sources that share one `SecretMasker`.
#[derive(Clone, Default)]
pub struct TraceManager {
    secret_masker: SecretMasker,
}

impl TraceManager {
    pub fn new(secret_masker: SecretMasker) -> Self {
        Self { secret_masker }
    }

    /// Get (create) a named trace source.
    pub fn get(&self, name: &str) -> Tracing {
        Tracing::new(name, self.secret_masker.clone())
    }

    /// Same source, boxed for APIs that take `Arc<dyn TraceWriter>`.
    pub fn get_writer(&self, name: &str) -> Arc<dyn TraceWriter> {
        Arc::new(self.get(name))
    }

    /// Access the shared secret masker.
    pub fn secret_masker(&self) -> &SecretMasker {
        &self.secret_masker
    }
}
