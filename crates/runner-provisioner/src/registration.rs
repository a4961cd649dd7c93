// Registration scope selection and registration-token acquisition.

use crate::api::{ApiError, RegistrationApi};
use crate::error::ProvisionError;
use chrono::{DateTime, Utc};
use provisioner_common::constants::github;
use provisioner_common::RunnerSettings;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// What the runner registers against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationScope {
    Repo { owner: String, repo: String },
    Org { org: String },
}

impl RegistrationScope {
    /// owner+repo → repo; org+repo → repo under the org; org alone → org.
    pub fn from_settings(settings: &RunnerSettings) -> Result<Self, ProvisionError> {
        let (owner, repo, org) = (&settings.owner, &settings.repo, &settings.org);

        if !owner.is_empty() && !repo.is_empty() {
            Ok(RegistrationScope::Repo {
                owner: owner.clone(),
                repo: repo.clone(),
            })
        } else if !org.is_empty() && !repo.is_empty() {
            Ok(RegistrationScope::Repo {
                owner: org.clone(),
                repo: repo.clone(),
            })
        } else if !org.is_empty() {
            Ok(RegistrationScope::Org { org: org.clone() })
        } else {
            Err(ProvisionError::config("not enough data to register runner"))
        }
    }

    /// The URL `config.sh` registers against.
    pub fn target_url(&self) -> String {
        match self {
            RegistrationScope::Repo { owner, repo } => {
                format!("{}/{}/{}", github::WEB_URL, owner, repo)
            }
            RegistrationScope::Org { org } => format!("{}/{}", github::WEB_URL, org),
        }
    }
}

impl fmt::Display for RegistrationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationScope::Repo { owner, repo } => write!(f, "repository {owner}/{repo}"),
            RegistrationScope::Org { org } => write!(f, "organization {org}"),
        }
    }
}

/// A registration token bound to the URL it is valid for.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationToken {
    value: String,
    target_url: String,
    expires_at: Option<DateTime<Utc>>,
}

impl RegistrationToken {
    pub fn new(value: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            target_url: target_url.into(),
            expires_at: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl fmt::Debug for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationToken")
            .field("value", &"***")
            .field("target_url", &self.target_url)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Request a registration token for `scope`. Failures are not retried.
///
/// The request, including any app installation-token exchange behind it, is
/// abandoned as soon as `cancellation_token` fires.
pub async fn acquire(
    api: &dyn RegistrationApi,
    scope: &RegistrationScope,
    cancellation_token: CancellationToken,
) -> Result<RegistrationToken, ProvisionError> {
    let request = async {
        match scope {
            RegistrationScope::Repo { owner, repo } => {
                api.create_repo_registration_token(owner, repo).await
            }
            RegistrationScope::Org { org } => api.create_org_registration_token(org).await,
        }
    };

    let outcome = tokio::select! {
        biased;
        _ = cancellation_token.cancelled() => Err(ApiError::Cancelled),
        issued = request => issued,
    };
    let issued = outcome.map_err(ProvisionError::Registration)?;

    Ok(RegistrationToken {
        value: issued.token,
        target_url: scope.target_url(),
        expires_at: issued.expires_at,
    })
}
