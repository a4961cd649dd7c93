// Bearer credentials for GitHub API requests: either a static token or a
// GitHub App installation token minted on demand from the app's private key.

use super::{status_error, ApiError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use provisioner_common::{SecretMasker, Tracing};
use provisioner_sdk::TraceWriter;
use serde::{Deserialize, Serialize};
use url::Url;

/// Backdate `iat` to tolerate clock drift between us and GitHub.
const JWT_BACKDATE: Duration = Duration::seconds(60);
/// GitHub rejects app JWTs that live longer than ten minutes.
const JWT_LIFETIME: Duration = Duration::minutes(9);
/// Refresh an installation token this long before GitHub expires it.
const REFRESH_MARGIN: Duration = Duration::minutes(1);

/// How requests are authorized.
pub enum Authenticator {
    /// A personal access or OAuth token sent as-is.
    Token(String),
    /// A GitHub App installation.
    AppInstallation(AppInstallationAuth),
}

impl Authenticator {
    /// The bearer token to send with the next request.
    pub async fn bearer_token(
        &self,
        http: &reqwest::Client,
        api_url: &Url,
    ) -> Result<String, ApiError> {
        match self {
            Authenticator::Token(token) => Ok(token.clone()),
            Authenticator::AppInstallation(auth) => auth.installation_token(http, api_url).await,
        }
    }

    /// Short name of the scheme, for logs.
    pub fn scheme(&self) -> &'static str {
        match self {
            Authenticator::Token(_) => "access token",
            Authenticator::AppInstallation(_) => "app installation",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

#[derive(Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Mints installation access tokens for one app installation and caches
/// them until shortly before they expire.
pub struct AppInstallationAuth {
    app_id: i64,
    installation_id: i64,
    key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
    secret_masker: SecretMasker,
    trace: Tracing,
}

impl AppInstallationAuth {
    /// Parse `private_key` (PEM, PKCS#1 or PKCS#8) for RS256 signing.
    pub fn new(
        app_id: i64,
        installation_id: i64,
        private_key: &[u8],
        secret_masker: SecretMasker,
        trace: Tracing,
    ) -> Result<Self, ApiError> {
        let key = EncodingKey::from_rsa_pem(private_key)?;
        Ok(Self {
            app_id,
            installation_id,
            key,
            cached: Mutex::new(None),
            secret_masker,
            trace,
        })
    }

    /// Sign a short-lived JWT asserting the app's identity.
    pub(crate) fn app_jwt(&self, now: DateTime<Utc>) -> Result<String, ApiError> {
        let claims = AppClaims {
            iat: (now - JWT_BACKDATE).timestamp(),
            exp: (now + JWT_LIFETIME).timestamp(),
            iss: self.app_id.to_string(),
        };
        let jwt = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)?;
        Ok(jwt)
    }

    /// Return the cached installation token, or exchange a fresh app JWT
    /// for a new one.
    pub async fn installation_token(
        &self,
        http: &reqwest::Client,
        api_url: &Url,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let cached = self.cached.lock().clone();
        if let Some(cached) = cached {
            if cached.expires_at - REFRESH_MARGIN > now {
                self.trace.verbose(&format!(
                    "Reusing installation token, expires at {}",
                    cached.expires_at
                ));
                return Ok(cached.token);
            }
        }

        self.trace.info(&format!(
            "Requesting access token for app {} installation {}",
            self.app_id, self.installation_id
        ));

        let installation = self.installation_id.to_string();
        let url = super::endpoint(
            api_url,
            &["app", "installations", installation.as_str(), "access_tokens"],
        )?;

        let jwt = self.app_jwt(now)?;
        let response = http
            .post(url)
            .bearer_auth(jwt)
            .header(reqwest::header::ACCEPT, provisioner_common::constants::github::ACCEPT)
            .header(
                "X-GitHub-Api-Version",
                provisioner_common::constants::github::API_VERSION,
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let issued: InstallationTokenResponse = response.json().await?;
        self.secret_masker.add_value(&issued.token);
        self.trace.info(&format!(
            "Installation token issued, expires at {}",
            issued.expires_at
        ));

        *self.cached.lock() = Some(CachedToken {
            token: issued.token.clone(),
            expires_at: issued.expires_at,
        });
        Ok(issued.token)
    }
}
