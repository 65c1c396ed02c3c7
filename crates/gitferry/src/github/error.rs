//! GitHub API error types and classification.

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Tree too large: {0}")]
    TreeTooLarge(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Refine a raw octocrab error into the variant the retry taxonomy needs.
///
/// GitHub reuses status codes heavily: 403 is both "abuse detection, slow
/// down" and "token lacks scope", and 422 is both validation failure and
/// "entity too large". Disambiguation is by message text, the way the API
/// documents it.
pub fn refine_octocrab_error(err: octocrab::Error, resource: &str) -> GitHubError {
    match &err {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            let message = source.message.to_ascii_lowercase();

            let rate_limited = message.contains("rate limit")
                || message.contains("abuse")
                || message.contains("secondary");

            match status {
                429 => GitHubError::RateLimited,
                403 if rate_limited => GitHubError::RateLimited,
                403 => GitHubError::PermissionDenied(source.message.clone()),
                404 => GitHubError::NotFound(resource.to_string()),
                413 => GitHubError::PayloadTooLarge(resource.to_string()),
                422 if message.contains("too large") || message.contains("too_large") => {
                    if message.contains("tree") {
                        GitHubError::TreeTooLarge(source.message.clone())
                    } else {
                        GitHubError::PayloadTooLarge(resource.to_string())
                    }
                }
                _ => GitHubError::Api(err),
            }
        }
        _ => GitHubError::Api(err),
    }
}

impl From<GitHubError> for RemoteError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::RateLimited => RemoteError::RateLimited { reset_at: None },
            GitHubError::PayloadTooLarge(resource) => RemoteError::payload_too_large(resource),
            GitHubError::TreeTooLarge(message) => RemoteError::TreeTooLarge { message },
            GitHubError::PermissionDenied(message) => RemoteError::permission(message),
            GitHubError::NotFound(resource) => RemoteError::not_found(resource),
            GitHubError::Api(e) => RemoteError::api(e.to_string()),
            GitHubError::Internal(message) => RemoteError::internal(message),
        }
    }
}
