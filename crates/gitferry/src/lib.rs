//! Gitferry - a repository transfer engine.
//!
//! This library moves file sets between two remote GitHub repositories
//! reliably despite the per-request size limits and rate limits the API
//! imposes. Oversized files are committed as a sequence of growing
//! snapshots, whole-repository copies land as batched tree commits, and
//! every remote write goes through a classified bounded-retry executor.
//!
//! The engine is generic over the [`remote::RemoteRepository`] trait, so
//! everything above the wire layer can be driven against an in-memory
//! remote in tests.
//!
//! # Example
//!
//! ```ignore
//! use gitferry::GitFerry;
//!
//! let mut ferry = GitFerry::from_default_store()?;
//! ferry.configure("ghp_...", "acme", "firmware", None)?;
//!
//! // Single file, auto-escalating to chunked commits when oversized.
//! ferry.update_file("src/main.c", &content, "Update firmware entry point").await?;
//! ```

pub mod ignore;
pub mod remote;
pub mod retry;
pub mod service;
pub mod store;
pub mod transfer;

pub mod github;

pub use remote::{
    ContentEncoding, FileBlob, RemoteError, RemoteRepository, RepositoryConfig, rate_limits,
};
pub use retry::{ErrorClass, RetryConfig};
pub use service::{GitFerry, ServiceError};
pub use transfer::{
    ComparisonStatus, FileComparison, MirrorOptions, ProgressCallback, ProgressEvent,
    TransferOptions, TransferOutcome,
};
