/// Build constants for the provisioner package, taken from compile-time
/// environment variables with sensible defaults.

/// Source control information.
pub struct Source;

impl Source {
    /// The commit hash from which this binary was built.
    /// Set via the `PROVISIONER_COMMIT_HASH` env var at compile time, or "N/A".
    pub const COMMIT_HASH: &'static str = match option_env!("PROVISIONER_COMMIT_HASH") {
        Some(h) => h,
        None => "N/A",
    };
}

/// Provisioner package metadata.
#[derive(Debug, Clone)]
pub struct ProvisionerPackage;

impl ProvisionerPackage {
    /// The semantic version, from `CARGO_PKG_VERSION`.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// Product name sent in the `User-Agent` header.
    pub const PRODUCT_NAME: &'static str = "runner-provisioner";

    /// `User-Agent` header value for outbound API requests.
    pub fn user_agent() -> String {
        format!("{}/{}", Self::PRODUCT_NAME, Self::VERSION)
    }
}
