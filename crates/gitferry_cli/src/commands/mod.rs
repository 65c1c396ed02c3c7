//! Command handlers and shared helpers.

pub mod configure;
pub mod diff;
pub mod history;
pub mod mirror;
pub mod push;

use gitferry::{GitFerry, RetryConfig};

use crate::config::Config;

/// Build the engine facade from the CLI configuration.
pub fn build_ferry(config: &Config) -> Result<GitFerry, Box<dyn std::error::Error>> {
    let ferry = GitFerry::from_default_store()?
        .with_retry(RetryConfig::default().with_max_attempts(config.transfer.max_attempts))
        .with_requests_per_second(config.transfer.requests_per_second);
    Ok(ferry)
}

/// Split an "owner/repo" reference.
pub fn parse_repo_ref(reference: &str) -> Result<(String, String), String> {
    match reference.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(format!(
            "invalid repository reference '{reference}', expected owner/repo"
        )),
    }
}
