//! Public operations facade.
//!
//! `GitFerry` owns the persisted repository configuration and hands each
//! operation an explicit client pair; source and destination configs are
//! plain values that coexist for the duration of a transfer.

use std::collections::HashSet;

use thiserror::Error;

use crate::github::GitHubClient;
use crate::remote::{
    ApiRateLimiter, CommitSummary, RemoteError, RemoteRepository, RepositoryConfig, rate_limits,
};
use crate::retry::RetryConfig;
use crate::store::{ConfigStore, StoreError, TomlConfigStore};
use crate::transfer::{
    self, ComparisonStatus, FileComparison, MirrorOptions, ProgressCallback, TransferOptions,
    TransferOutcome, TransferReport, UploadFile,
};

/// Errors surfaced by the operations facade.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No repository configured. Run configure first")]
    NotConfigured,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// The transfer engine's front door.
pub struct GitFerry<S: ConfigStore = TomlConfigStore> {
    store: S,
    active: Option<RepositoryConfig>,
    retry: RetryConfig,
    requests_per_second: u32,
}

impl GitFerry<TomlConfigStore> {
    /// Create a facade over the default config file location, loading any
    /// previously persisted configuration.
    pub fn from_default_store() -> Result<Self, ServiceError> {
        Self::new(TomlConfigStore::from_default_path()?)
    }
}

impl<S: ConfigStore> GitFerry<S> {
    /// Create a facade over an explicit store.
    pub fn new(store: S) -> Result<Self, ServiceError> {
        let active = store.load()?;
        Ok(Self {
            store,
            active,
            retry: RetryConfig::default(),
            requests_per_second: rate_limits::GITHUB_DEFAULT_RPS,
        })
    }

    /// Override the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the proactive rate limit.
    #[must_use]
    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps;
        self
    }

    /// Persist and activate a repository configuration.
    pub fn configure(
        &mut self,
        token: &str,
        owner: &str,
        repo: &str,
        branch: Option<&str>,
    ) -> Result<(), ServiceError> {
        let mut config = RepositoryConfig::new(token, owner, repo);
        if let Some(branch) = branch {
            config = config.with_branch(branch);
        }
        self.store.save(&config)?;
        self.active = Some(config);
        Ok(())
    }

    /// Whether a repository configuration is active.
    pub fn is_configured(&self) -> bool {
        self.active.is_some()
    }

    /// The active configuration, if any.
    pub fn active_config(&self) -> Option<&RepositoryConfig> {
        self.active.as_ref()
    }

    /// Clear the persisted configuration and deactivate.
    pub fn disconnect(&mut self) -> Result<(), ServiceError> {
        self.store.clear()?;
        self.active = None;
        Ok(())
    }

    fn require_config(&self) -> Result<&RepositoryConfig, ServiceError> {
        self.active.as_ref().ok_or(ServiceError::NotConfigured)
    }

    fn destination_client(&self) -> Result<GitHubClient, ServiceError> {
        let config = self.require_config()?;
        let limiter = ApiRateLimiter::new(self.requests_per_second);
        Ok(GitHubClient::new(config.clone(), Some(limiter))?)
    }

    /// A client for a source repository, reusing the active token.
    fn source_client(
        &self,
        owner: &str,
        repo: &str,
        branch: Option<&str>,
    ) -> Result<GitHubClient, ServiceError> {
        let active = self.require_config()?;
        let mut config = RepositoryConfig::new(&active.token, owner, repo);
        if let Some(branch) = branch {
            config = config.with_branch(branch);
        }
        let limiter = ApiRateLimiter::new(self.requests_per_second);
        Ok(GitHubClient::new(config, Some(limiter))?)
    }

    /// Commit one file, escalating to chunked commits when oversized.
    ///
    /// Returns true on success; all failures surface as errors.
    pub async fn update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<bool, ServiceError> {
        let client = self.destination_client()?;
        transfer::commit_file(&client, path, content, message, &self.retry, None).await?;
        Ok(true)
    }

    /// Upload a set of files with a size-appropriate strategy.
    pub async fn upload_multiple_files(
        &self,
        files: Vec<UploadFile>,
        message: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<TransferOutcome, ServiceError> {
        let client = self.destination_client()?;
        Ok(transfer::upload_files(&client, files, message, &self.retry, on_progress).await)
    }

    /// Compare a source repository against the configured destination.
    pub async fn compare_repositories(
        &self,
        source_owner: &str,
        source_repo: &str,
        source_branch: Option<&str>,
    ) -> Result<Vec<FileComparison>, ServiceError> {
        let source = self.source_client(source_owner, source_repo, source_branch)?;
        let dest = self.destination_client()?;
        Ok(transfer::compare_repositories(&source, &dest, None).await?)
    }

    /// Transfer the comparison classes selected by `options`.
    ///
    /// Returns true when anything was transferred. Deleted paths are only
    /// applied when `options.include_deleted` is set, and deletion means
    /// the path is left out of future batches; destination history keeps
    /// prior content.
    pub async fn transfer_modified_files(
        &self,
        comparisons: &[FileComparison],
        source_owner: &str,
        source_repo: &str,
        source_branch: Option<&str>,
        message: &str,
        options: TransferOptions,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<bool, ServiceError> {
        let selected: HashSet<String> = comparisons
            .iter()
            .filter(|comparison| match comparison.status {
                ComparisonStatus::New => options.include_new,
                ComparisonStatus::Modified => options.include_modified,
                ComparisonStatus::Deleted => options.include_deleted,
                ComparisonStatus::Unchanged => false,
            })
            // A deleted path has nothing to download from the source.
            .filter(|comparison| comparison.status != ComparisonStatus::Deleted)
            .map(|comparison| comparison.path.clone())
            .collect();

        if selected.is_empty() {
            return Ok(false);
        }

        let source = self.source_client(source_owner, source_repo, source_branch)?;
        let dest = self.destination_client()?;
        let report = transfer::transfer_selected(
            &source,
            &dest,
            &selected,
            message,
            &self.retry,
            on_progress,
        )
        .await?;

        Ok(report.files_committed > 0)
    }

    /// Copy a whole source repository into the configured destination.
    pub async fn transfer_repository(
        &self,
        source_owner: &str,
        source_repo: &str,
        source_branch: Option<&str>,
        message: &str,
        options: &MirrorOptions,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<TransferReport, ServiceError> {
        let source = self.source_client(source_owner, source_repo, source_branch)?;
        let dest = self.destination_client()?;
        Ok(transfer::transfer_repository(
            &source,
            &dest,
            message,
            options,
            &self.retry,
            on_progress,
        )
        .await?)
    }

    /// List recent commits on the configured branch.
    pub async fn get_commit_history(
        &self,
        limit: usize,
    ) -> Result<Vec<CommitSummary>, ServiceError> {
        let config = self.require_config()?;
        let branch = config.branch.clone();
        let client = self.destination_client()?;
        Ok(client.list_commits(&branch, limit).await?)
    }
}
