// Picks exactly one way to authenticate from the settings and builds the
// GitHub client for it.

use crate::api::{AppInstallationAuth, Authenticator, GitHubClient};
use crate::error::ProvisionError;
use provisioner_common::{RunnerSettings, TraceManager};
use provisioner_sdk::TraceWriter;
use std::fmt;

/// The credentials a run authenticates with.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    AccessToken {
        value: String,
    },
    AppInstallation {
        app_id: i64,
        installation_id: i64,
        private_key: Vec<u8>,
    },
}

impl Credentials {
    /// Select the credential variant the settings describe.
    ///
    /// App installation wins when the app id, installation id and key
    /// material are all present; otherwise a non-empty access token is used.
    pub fn from_settings(settings: &RunnerSettings) -> Result<Self, ProvisionError> {
        let private_key = private_key_material(settings)?;

        match private_key {
            Some(private_key)
                if settings.app_id != 0
                    && settings.app_installation_id != 0
                    && !private_key.is_empty() =>
            {
                Ok(Credentials::AppInstallation {
                    app_id: settings.app_id,
                    installation_id: settings.app_installation_id,
                    private_key,
                })
            }
            _ if !settings.access_token.is_empty() => Ok(Credentials::AccessToken {
                value: settings.access_token.clone(),
            }),
            _ => Err(ProvisionError::config(
                "not enough data to initialize the client",
            )),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::AccessToken { .. } => {
                f.debug_struct("AccessToken").field("value", &"***").finish()
            }
            Credentials::AppInstallation {
                app_id,
                installation_id,
                ..
            } => f
                .debug_struct("AppInstallation")
                .field("app_id", app_id)
                .field("installation_id", installation_id)
                .field("private_key", &"***")
                .finish(),
        }
    }
}

/// Inline key first, then the key file. The file is only read when no
/// inline key is configured.
fn private_key_material(settings: &RunnerSettings) -> Result<Option<Vec<u8>>, ProvisionError> {
    if !settings.app_private_key.is_empty() {
        return Ok(Some(settings.app_private_key.as_bytes().to_vec()));
    }
    if !settings.app_private_key_path.is_empty() {
        let key = std::fs::read(&settings.app_private_key_path).map_err(|source| {
            ProvisionError::Io {
                context: "failed to read private key from file",
                source,
            }
        })?;
        return Ok(Some(key));
    }
    Ok(None)
}

/// Build the authenticated client for `credentials`. No network call is made.
pub fn create_client(
    credentials: Credentials,
    traces: &TraceManager,
) -> Result<GitHubClient, ProvisionError> {
    let auth = match credentials {
        Credentials::AccessToken { value } => {
            traces.secret_masker().add_value(&value);
            Authenticator::Token(value)
        }
        Credentials::AppInstallation {
            app_id,
            installation_id,
            private_key,
        } => Authenticator::AppInstallation(
            AppInstallationAuth::new(
                app_id,
                installation_id,
                &private_key,
                traces.secret_masker().clone(),
                traces.get("AppInstallationAuth"),
            )
            .map_err(ProvisionError::ClientInit)?,
        ),
    };

    let trace = traces.get("GitHubClient");
    trace.info(&format!("Authenticating with {}", auth.scheme()));
    GitHubClient::new(auth, trace).map_err(ProvisionError::ClientInit)
}

/// Settings → credentials → client.
pub fn resolve(
    settings: &RunnerSettings,
    traces: &TraceManager,
) -> Result<GitHubClient, ProvisionError> {
    let credentials = Credentials::from_settings(settings)?;
    create_client(credentials, traces)
}
