// GitHub REST client for the self-hosted runner registration-token endpoints.

use super::{endpoint, status_error, ApiError, Authenticator};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use provisioner_common::constants::github;
use provisioner_common::{HttpClientFactory, Tracing};
use provisioner_sdk::TraceWriter;
use serde::Deserialize;
use std::fmt;
use url::Url;

/// A registration token as returned by the API.
#[derive(Clone, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The two remote operations the provisioner needs.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    /// `POST /repos/{owner}/{repo}/actions/runners/registration-token`
    async fn create_repo_registration_token(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<IssuedToken, ApiError>;

    /// `POST /orgs/{org}/actions/runners/registration-token`
    async fn create_org_registration_token(&self, org: &str) -> Result<IssuedToken, ApiError>;
}

/// An authenticated GitHub API client.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: Url,
    auth: Authenticator,
    trace: Tracing,
}

impl GitHubClient {
    /// Build a client against the public GitHub API. No request is made.
    pub fn new(auth: Authenticator, trace: Tracing) -> Result<Self, ApiError> {
        let http = HttpClientFactory::create_client()?;
        let api_url = Url::parse(github::API_URL)?;
        Ok(Self {
            http,
            api_url,
            auth,
            trace,
        })
    }

    /// Point the client at another API base, e.g. a local stub.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ApiError> {
        self.api_url = Url::parse(api_url)?;
        Ok(self)
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    async fn create_registration_token(&self, segments: &[&str]) -> Result<IssuedToken, ApiError> {
        let url = endpoint(&self.api_url, segments)?;
        self.trace
            .info(&format!("Requesting registration token: POST {}", url.path()));

        let bearer = self.auth.bearer_token(&self.http, &self.api_url).await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .header(reqwest::header::ACCEPT, github::ACCEPT)
            .header("X-GitHub-Api-Version", github::API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let issued: IssuedToken = response.json().await?;
        if let Some(expires_at) = issued.expires_at {
            self.trace
                .info(&format!("Registration token expires at {expires_at}"));
        }
        Ok(issued)
    }
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url.as_str())
            .field("auth", &self.auth.scheme())
            .finish()
    }
}

#[async_trait]
impl RegistrationApi for GitHubClient {
    async fn create_repo_registration_token(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<IssuedToken, ApiError> {
        self.create_registration_token(&[
            "repos",
            owner,
            repo,
            "actions",
            "runners",
            "registration-token",
        ])
        .await
    }

    async fn create_org_registration_token(&self, org: &str) -> Result<IssuedToken, ApiError> {
        self.create_registration_token(&["orgs", org, "actions", "runners", "registration-token"])
            .await
    }
}
