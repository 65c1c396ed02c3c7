//! GitHub client implementing the `RemoteRepository` trait.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use octocrab::Octocrab;

use super::error::{GitHubError, refine_octocrab_error};
use super::types::{
    BLOB_MODE, BLOB_TYPE, BlobResponse, CommitListItem, CommitResponse, ContentsGetResponse,
    ContentsPutRequest, ContentsPutResponse, CreateBlobRequest, CreateBlobResponse,
    CreateCommitRequest, CreateCommitResponse, CreateRefRequest, CreateTreeEntry,
    CreateTreeRequest, CreateTreeResponse, RefResponse, RepoResponse, TreeResponse,
    UpdateRefRequest,
};
use crate::remote::{
    ApiRateLimiter, CommitSummary, ContentEncoding, ExistingFile, NewTreeEntry, PutFileResult,
    RemoteError, RemoteRepository, RemoteTreeEntry, RepositoryConfig,
};

/// Create an authenticated Octocrab instance from a token.
fn create_octocrab(token: &str) -> Result<Octocrab, GitHubError> {
    Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(GitHubError::Api)
}

/// GitHub API client bound to one repository endpoint.
///
/// Cheap to clone; the underlying HTTP client is shared. Source and
/// destination sides of a transfer are two independent `GitHubClient`
/// values, never a shared mutable client.
#[derive(Clone)]
pub struct GitHubClient {
    inner: Arc<Octocrab>,
    config: RepositoryConfig,
    /// Optional proactive rate limiter awaited before each request.
    rate_limiter: Option<ApiRateLimiter>,
}

impl GitHubClient {
    /// Create a client for a repository endpoint.
    pub fn new(
        config: RepositoryConfig,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Result<Self, RemoteError> {
        let inner = create_octocrab(&config.token)?;
        Ok(Self {
            inner: Arc::new(inner),
            config,
            rate_limiter,
        })
    }

    /// Wait for the rate limiter if one is configured.
    async fn wait(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }

    fn repo_route(&self, suffix: &str) -> String {
        format!(
            "/repos/{}/{}/{}",
            self.config.owner, self.config.repo, suffix
        )
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token deliberately omitted.
        f.debug_struct("GitHubClient")
            .field("owner", &self.config.owner)
            .field("repo", &self.config.repo)
            .field("branch", &self.config.branch)
            .finish()
    }
}

#[async_trait]
impl RemoteRepository for GitHubClient {
    fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    async fn default_branch(&self) -> Result<String, RemoteError> {
        self.wait().await;
        let repo: RepoResponse = self
            .inner
            .get(
                format!("/repos/{}/{}", self.config.owner, self.config.repo),
                None::<&()>,
            )
            .await
            .map_err(|e| refine_octocrab_error(e, &self.config.full_name()))?;
        Ok(repo.default_branch)
    }

    async fn branch_head(&self, branch: &str) -> Result<Option<String>, RemoteError> {
        self.wait().await;
        let route = self.repo_route(&format!("git/ref/heads/{branch}"));
        let result: Result<RefResponse, octocrab::Error> = self.inner.get(&route, None::<&()>).await;

        match result {
            Ok(reference) => Ok(Some(reference.object.sha)),
            Err(e) => match refine_octocrab_error(e, &format!("branch {branch}")) {
                // An absent ref is the normal first-write case.
                GitHubError::NotFound(_) => Ok(None),
                other => Err(other.into()),
            },
        }
    }

    async fn commit_tree_sha(&self, commit_sha: &str) -> Result<String, RemoteError> {
        self.wait().await;
        let route = self.repo_route(&format!("git/commits/{commit_sha}"));
        let commit: CommitResponse = self
            .inner
            .get(&route, None::<&()>)
            .await
            .map_err(|e| refine_octocrab_error(e, &format!("commit {commit_sha}")))?;
        Ok(commit.tree.sha)
    }

    async fn list_tree(&self, tree_sha: &str) -> Result<Vec<RemoteTreeEntry>, RemoteError> {
        self.wait().await;
        let route = self.repo_route(&format!("git/trees/{tree_sha}?recursive=1"));
        let tree: TreeResponse = self
            .inner
            .get(&route, None::<&()>)
            .await
            .map_err(|e| refine_octocrab_error(e, &format!("tree {tree_sha}")))?;

        if tree.truncated {
            tracing::warn!(
                "tree listing for {} was truncated by the API; some files will be missed",
                tree_sha
            );
        }

        Ok(tree
            .tree
            .into_iter()
            .filter(|item| item.item_type == BLOB_TYPE)
            .map(|item| RemoteTreeEntry {
                path: item.path,
                sha: item.sha,
                size: item.size,
            })
            .collect())
    }

    async fn fetch_blob(&self, sha: &str) -> Result<Vec<u8>, RemoteError> {
        self.wait().await;
        let route = self.repo_route(&format!("git/blobs/{sha}"));
        let blob: BlobResponse = self
            .inner
            .get(&route, None::<&()>)
            .await
            .map_err(|e| refine_octocrab_error(e, &format!("blob {sha}")))?;

        if blob.encoding != "base64" {
            return Ok(blob.content.into_bytes());
        }

        // The API wraps base64 content at 60 columns.
        let compact: String = blob.content.split_whitespace().collect();
        BASE64
            .decode(compact.as_bytes())
            .map_err(|e| RemoteError::internal(format!("blob {sha} base64 decode failed: {e}")))
    }

    async fn create_blob(
        &self,
        content: &str,
        encoding: ContentEncoding,
    ) -> Result<String, RemoteError> {
        self.wait().await;
        let route = self.repo_route("git/blobs");
        let body = CreateBlobRequest {
            content,
            encoding: encoding.as_str(),
        };
        let created: CreateBlobResponse = self
            .inner
            .post(&route, Some(&body))
            .await
            .map_err(|e| refine_octocrab_error(e, "blob"))?;
        Ok(created.sha)
    }

    async fn create_tree(
        &self,
        base_tree: Option<&str>,
        entries: &[NewTreeEntry],
    ) -> Result<String, RemoteError> {
        self.wait().await;
        let route = self.repo_route("git/trees");
        let body = CreateTreeRequest {
            base_tree,
            tree: entries
                .iter()
                .map(|entry| CreateTreeEntry {
                    path: entry.path.clone(),
                    mode: BLOB_MODE,
                    entry_type: BLOB_TYPE,
                    sha: entry.sha.clone(),
                })
                .collect(),
        };
        let created: CreateTreeResponse = self
            .inner
            .post(&route, Some(&body))
            .await
            .map_err(|e| refine_octocrab_error(e, "tree"))?;
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> Result<String, RemoteError> {
        self.wait().await;
        let route = self.repo_route("git/commits");
        let body = CreateCommitRequest {
            message,
            tree: tree_sha,
            parents,
        };
        let created: CreateCommitResponse = self
            .inner
            .post(&route, Some(&body))
            .await
            .map_err(|e| refine_octocrab_error(e, "commit"))?;
        Ok(created.sha)
    }

    async fn update_ref(
        &self,
        branch: &str,
        commit_sha: &str,
        force: bool,
    ) -> Result<(), RemoteError> {
        self.wait().await;
        let route = self.repo_route(&format!("git/refs/heads/{branch}"));
        let body = UpdateRefRequest {
            sha: commit_sha,
            force,
        };
        let result: Result<serde_json::Value, octocrab::Error> =
            self.inner.patch(&route, Some(&body)).await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match refine_octocrab_error(e, &format!("ref heads/{branch}")) {
                // The ref does not exist yet; create it instead.
                GitHubError::NotFound(_) => {
                    let create_route = self.repo_route("git/refs");
                    let body = CreateRefRequest {
                        ref_name: format!("refs/heads/{branch}"),
                        sha: commit_sha,
                    };
                    let _: serde_json::Value = self
                        .inner
                        .post(&create_route, Some(&body))
                        .await
                        .map_err(|e| refine_octocrab_error(e, &format!("ref heads/{branch}")))?;
                    Ok(())
                }
                other => Err(other.into()),
            },
        }
    }

    async fn get_file(
        &self,
        path: &str,
        branch: &str,
    ) -> Result<Option<ExistingFile>, RemoteError> {
        self.wait().await;
        let route = self.repo_route(&format!("contents/{path}?ref={branch}"));
        let result: Result<ContentsGetResponse, octocrab::Error> =
            self.inner.get(&route, None::<&()>).await;

        match result {
            Ok(contents) => Ok(Some(ExistingFile {
                sha: contents.sha,
                size: contents.size,
            })),
            Err(e) => match refine_octocrab_error(e, path) {
                GitHubError::NotFound(_) => Ok(None),
                other => Err(other.into()),
            },
        }
    }

    async fn put_file(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        previous_sha: Option<&str>,
        branch: &str,
    ) -> Result<PutFileResult, RemoteError> {
        self.wait().await;
        let route = self.repo_route(&format!("contents/{path}"));
        let body = ContentsPutRequest {
            message,
            content: content_base64,
            sha: previous_sha,
            branch,
        };
        let response: ContentsPutResponse = self
            .inner
            .put(&route, Some(&body))
            .await
            .map_err(|e| refine_octocrab_error(e, path))?;

        let content_sha = response
            .content
            .map(|c| c.sha)
            .ok_or_else(|| RemoteError::internal(format!("no content sha returned for {path}")))?;

        Ok(PutFileResult {
            content_sha,
            commit_sha: response.commit.sha,
        })
    }

    async fn list_commits(
        &self,
        branch: &str,
        limit: usize,
    ) -> Result<Vec<CommitSummary>, RemoteError> {
        self.wait().await;
        let route = self.repo_route(&format!("commits?sha={branch}&per_page={limit}"));
        let commits: Vec<CommitListItem> = self
            .inner
            .get(&route, None::<&()>)
            .await
            .map_err(|e| refine_octocrab_error(e, &format!("commits on {branch}")))?;

        Ok(commits
            .into_iter()
            .map(|item| CommitSummary {
                sha: item.sha,
                message: item.commit.message,
                author: item.commit.author.as_ref().and_then(|a| a.name.clone()),
                date: item.commit.author.as_ref().and_then(|a| a.date),
                url: item.html_url,
            })
            .collect())
    }
}
