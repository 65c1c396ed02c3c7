//! GitHub implementation of the remote repository interface.
//!
//! Thin octocrab wrapper: raw route calls with serde wire types, error
//! refinement into the shared retry taxonomy, and an optional proactive
//! rate limiter awaited before every request.

mod client;
mod error;
mod types;

pub use client::GitHubClient;
pub use error::{GitHubError, refine_octocrab_error};
