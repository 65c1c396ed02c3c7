use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::retry::ErrorClass;

/// Errors that can occur when interacting with a remote repository.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// API error from the remote host.
    #[error("API error: {message}")]
    Api { message: String },

    /// Rate limit or abuse detection triggered.
    #[error("Rate limit exceeded{}", reset_display(.reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// A single write was rejected as too large.
    #[error("Payload too large: {resource}")]
    PayloadTooLarge { resource: String },

    /// The remote rejected a tree object as too large. Terminal: the fix
    /// is fewer files per batch or splitting the repository, not a retry.
    #[error(
        "Tree too large: {message}. Reduce the number of files per batch or split the repository"
    )]
    TreeTooLarge { message: String },

    /// Token lacks the scope required for the operation.
    #[error("Permission denied: {message}. Check that the token has write access to the repository")]
    PermissionDenied { message: String },

    /// Resource not found (branch, ref, blob, file).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Network or transport error.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Unexpected/internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn reset_display(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(". Resets at {at}"),
        None => String::new(),
    }
}

impl RemoteError {
    /// Create an API error.
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a payload-too-large error.
    #[inline]
    pub fn payload_too_large(resource: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            resource: resource.into(),
        }
    }

    /// Create a permission error.
    #[inline]
    pub fn permission(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a not found error.
    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is a rate limit error (retryable with backoff).
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Check if this error is a size rejection that the caller can handle
    /// by escalating to the chunked strategy.
    #[inline]
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self, Self::PayloadTooLarge { .. })
    }

    /// Map this error into the retry executor's taxonomy.
    ///
    /// Rate limits back off exponentially; network and generic API errors
    /// get bounded retries; everything else is terminal. Size rejections
    /// are terminal here on purpose: escalation to chunking happens at the
    /// call site, not inside the retry loop.
    pub fn retry_class(&self) -> ErrorClass {
        match self {
            Self::RateLimited { .. } => ErrorClass::RateLimited,
            Self::Network { .. } | Self::Api { .. } | Self::Internal { .. } => ErrorClass::Transient,
            Self::PayloadTooLarge { .. }
            | Self::TreeTooLarge { .. }
            | Self::PermissionDenied { .. }
            | Self::NotFound { .. } => ErrorClass::Fatal,
        }
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which is useful for errors
/// that include backtraces or multi-line details.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
