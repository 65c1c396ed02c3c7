//! Host-agnostic view of a remote code repository.
//!
//! This module defines the `RemoteRepository` trait: the only surface the
//! transfer engine uses to talk to a code-hosting API. The production
//! implementation lives in [`crate::github`]; tests drive the engine
//! against an in-memory remote.
//!
//! # Example
//!
//! ```ignore
//! use gitferry::remote::{RemoteRepository, RemoteError};
//!
//! async fn head_tree<R: RemoteRepository>(remote: &R) -> Result<String, RemoteError> {
//!     let branch = remote.config().branch.clone();
//!     let head = remote
//!         .branch_head(&branch)
//!         .await?
//!         .ok_or_else(|| RemoteError::not_found(format!("branch {branch}")))?;
//!     remote.commit_tree_sha(&head).await
//! }
//! ```

mod errors;
mod rate_limit;
mod types;

pub use errors::{RemoteError, Result, short_error_message};
pub use rate_limit::{ApiRateLimiter, rate_limits};
pub use types::{
    CommitSummary, ContentEncoding, DEFAULT_BRANCH, ExistingFile, FileBlob, NewTreeEntry,
    PutFileResult, RemoteRepository, RemoteTreeEntry, RepositoryConfig,
};
