//! Serde wire types for the GitHub git data and contents endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mode for regular file tree entries.
pub const BLOB_MODE: &str = "100644";

/// Object type for blob tree entries.
pub const BLOB_TYPE: &str = "blob";

#[derive(Debug, Deserialize)]
pub struct RepoResponse {
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
pub struct RefResponse {
    pub object: RefObject,
}

#[derive(Debug, Deserialize)]
pub struct RefObject {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitResponse {
    pub tree: TreeRef,
}

#[derive(Debug, Deserialize)]
pub struct TreeRef {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeItem>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct TreeItem {
    pub path: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub sha: String,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct BlobResponse {
    pub content: String,
    pub encoding: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBlobRequest<'a> {
    pub content: &'a str,
    pub encoding: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateBlobResponse {
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTreeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<&'a str>,
    pub tree: Vec<CreateTreeEntry>,
}

#[derive(Debug, Serialize)]
pub struct CreateTreeEntry {
    pub path: String,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub entry_type: &'static str,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTreeResponse {
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub struct CreateCommitRequest<'a> {
    pub message: &'a str,
    pub tree: &'a str,
    pub parents: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct CreateCommitResponse {
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UpdateRefRequest<'a> {
    pub sha: &'a str,
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct ContentsGetResponse {
    pub sha: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct ContentsPutRequest<'a> {
    pub message: &'a str,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    pub branch: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ContentsPutResponse {
    pub content: Option<ContentsInfo>,
    pub commit: CommitRefInfo,
}

#[derive(Debug, Deserialize)]
pub struct ContentsInfo {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitRefInfo {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitListItem {
    pub sha: String,
    pub commit: CommitDetail,
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct CommitAuthor {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}
