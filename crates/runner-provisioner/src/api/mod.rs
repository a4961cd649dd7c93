// GitHub REST API access: authentication and the registration-token endpoints.

pub mod authenticator;
pub mod client;

#[cfg(test)]
pub(crate) mod test_support;

pub use authenticator::{AppInstallationAuth, Authenticator};
pub use client::{GitHubClient, IssuedToken, RegistrationApi};

/// Failures talking to the GitHub API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to sign app JWT")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("invalid API URL")]
    Url(#[from] url::ParseError),

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

/// Shape of GitHub's error bodies.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Turn a non-success response into `ApiError::Status`, keeping GitHub's
/// `message` when the body has one.
async fn status_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ => body,
    };
    ApiError::Status { status, message }
}

/// Append `segments` to the API base URL, percent-encoding each one.
fn endpoint(api_url: &url::Url, segments: &[&str]) -> Result<url::Url, ApiError> {
    let mut url = api_url.clone();
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
