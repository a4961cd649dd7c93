// Builds the `reqwest::Client` used for every GitHub API call.

use provisioner_sdk::ProvisionerPackage;
use reqwest::Client;
use std::time::Duration;

/// Whole-request timeout for API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(100);
/// TCP/TLS connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates HTTP clients configured for the provisioner.
///
/// Proxy settings come from the standard `HTTP_PROXY` / `HTTPS_PROXY` /
/// `NO_PROXY` variables, which `reqwest` reads itself.
pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Create a new client with timeouts and the provisioner user agent.
    pub fn create_client() -> reqwest::Result<Client> {
        Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(ProvisionerPackage::user_agent())
            .build()
    }
}
