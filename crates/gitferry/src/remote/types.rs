use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::Result;

/// Branch used when the caller does not specify one.
pub const DEFAULT_BRANCH: &str = "main";

/// File extensions kept as base64 without attempting UTF-8 decoding.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "bmp", "tiff", "pdf", "zip", "gz", "tar", "bz2",
    "xz", "7z", "rar", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "wav", "ogg", "avi",
    "mov", "webm", "exe", "dll", "dylib", "bin", "wasm", "jar", "sqlite", "db",
];

/// Identifies one remote repository endpoint with write credentials.
///
/// Plain immutable value: a transfer holds a source config and a
/// destination config side by side, and neither is ever global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Personal access token. Never logged.
    pub token: String,
    /// Repository owner (user or org).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Target branch.
    pub branch: String,
}

impl RepositoryConfig {
    /// Create a config targeting the default branch.
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }

    /// Replace the target branch.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Get the full name (owner/repo).
    #[inline]
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// How a [`FileBlob`]'s content string is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// Raw text, committed as-is.
    Utf8,
    /// Base64-encoded bytes, for binary files and undecodable text.
    Base64,
}

impl ContentEncoding {
    /// Wire value expected by the blob creation endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Base64 => "base64",
        }
    }
}

/// One file's full content, staged in memory between download and upload.
#[derive(Debug, Clone)]
pub struct FileBlob {
    /// Repo-relative path, forward-slash separated.
    pub path: String,
    /// Content, raw text or base64 depending on `encoding`.
    pub content: String,
    /// Encoding of `content`.
    pub encoding: ContentEncoding,
    /// Decoded size in bytes.
    pub size: usize,
}

impl FileBlob {
    /// Stage raw bytes for a path, deciding the encoding.
    ///
    /// Paths with a known binary extension stay base64. Everything else is
    /// attempted as UTF-8 text, falling back to base64 when the bytes do
    /// not decode.
    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let size = bytes.len();

        if is_binary_path(&path) {
            return Self {
                path,
                content: BASE64.encode(&bytes),
                encoding: ContentEncoding::Base64,
                size,
            };
        }

        match String::from_utf8(bytes) {
            Ok(text) => Self {
                path,
                content: text,
                encoding: ContentEncoding::Utf8,
                size,
            },
            Err(not_text) => Self {
                path,
                content: BASE64.encode(not_text.as_bytes()),
                encoding: ContentEncoding::Base64,
                size,
            },
        }
    }

    /// Stage a text file.
    pub fn from_text(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            path: path.into(),
            size: text.len(),
            content: text,
            encoding: ContentEncoding::Utf8,
        }
    }
}

/// Check whether a path's extension marks it as binary.
pub fn is_binary_path(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// One blob entry from a recursive tree listing.
#[derive(Debug, Clone)]
pub struct RemoteTreeEntry {
    /// Repo-relative path.
    pub path: String,
    /// Content hash assigned by the remote.
    pub sha: String,
    /// Blob size in bytes, when the listing includes it.
    pub size: Option<u64>,
}

/// A new tree entry referencing a blob created on the destination.
///
/// Mode and type are fixed ("100644" regular file, "blob") and filled in
/// at the wire layer.
#[derive(Debug, Clone)]
pub struct NewTreeEntry {
    pub path: String,
    pub sha: String,
}

/// Metadata of a file that already exists on a branch.
#[derive(Debug, Clone)]
pub struct ExistingFile {
    /// Content sha used as the precondition for the next write.
    pub sha: String,
    /// Size in bytes.
    pub size: u64,
}

/// Result of a create-or-update file write.
#[derive(Debug, Clone)]
pub struct PutFileResult {
    /// Content sha of the written file, threaded into the next chunk write.
    pub content_sha: String,
    /// Sha of the commit the write produced.
    pub commit_sha: String,
}

/// One commit from the history listing.
#[derive(Debug, Clone)]
pub struct CommitSummary {
    pub sha: String,
    pub message: String,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

/// Trait for remote repository access.
///
/// The transfer engine is generic over this trait. Implementations should
/// map host-specific errors into [`super::RemoteError`] so the retry
/// executor can classify them; retries themselves happen above this
/// layer, not inside it.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// The repository this client is bound to.
    fn config(&self) -> &RepositoryConfig;

    /// Resolve the repository's default branch.
    async fn default_branch(&self) -> Result<String>;

    /// Resolve a branch ref to its head commit sha.
    ///
    /// Returns `Ok(None)` when the branch does not exist; an absent ref is
    /// a normal first-write situation, not an error.
    async fn branch_head(&self, branch: &str) -> Result<Option<String>>;

    /// Resolve a commit sha to its root tree sha.
    async fn commit_tree_sha(&self, commit_sha: &str) -> Result<String>;

    /// List a tree recursively, returning blob entries only.
    async fn list_tree(&self, tree_sha: &str) -> Result<Vec<RemoteTreeEntry>>;

    /// Download a blob's raw bytes.
    async fn fetch_blob(&self, sha: &str) -> Result<Vec<u8>>;

    /// Create a blob object, returning its sha.
    async fn create_blob(&self, content: &str, encoding: ContentEncoding) -> Result<String>;

    /// Create a tree object from a base tree plus new entries.
    async fn create_tree(
        &self,
        base_tree: Option<&str>,
        entries: &[NewTreeEntry],
    ) -> Result<String>;

    /// Create a commit object, returning its sha.
    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> Result<String>;

    /// Point a branch ref at a commit, creating the ref if absent.
    async fn update_ref(&self, branch: &str, commit_sha: &str, force: bool) -> Result<()>;

    /// Fetch metadata of an existing file, or `None` when absent.
    async fn get_file(&self, path: &str, branch: &str) -> Result<Option<ExistingFile>>;

    /// Create or update a file through the contents endpoint.
    ///
    /// `previous_sha` is the optimistic-concurrency precondition: it must
    /// match the file's current content sha, or be `None` for a new file.
    async fn put_file(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        previous_sha: Option<&str>,
        branch: &str,
    ) -> Result<PutFileResult>;

    /// List recent commits on a branch, newest first.
    async fn list_commits(&self, branch: &str, limit: usize) -> Result<Vec<CommitSummary>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_detection_by_extension() {
        assert!(is_binary_path("logo.png"));
        assert!(is_binary_path("assets/fonts/inter.WOFF2"));
        assert!(is_binary_path("release.tar.gz"));
        assert!(!is_binary_path("src/main.rs"));
        assert!(!is_binary_path("Makefile"));
    }

    #[test]
    fn from_bytes_keeps_text_as_utf8() {
        let blob = FileBlob::from_bytes("src/lib.rs", b"fn main() {}".to_vec());
        assert_eq!(blob.encoding, ContentEncoding::Utf8);
        assert_eq!(blob.content, "fn main() {}");
        assert_eq!(blob.size, 12);
    }

    #[test]
    fn from_bytes_encodes_binary_extension() {
        let bytes = vec![0x89, b'P', b'N', b'G'];
        let blob = FileBlob::from_bytes("logo.png", bytes.clone());
        assert_eq!(blob.encoding, ContentEncoding::Base64);
        assert_eq!(blob.content, BASE64.encode(&bytes));
        assert_eq!(blob.size, 4);
    }

    #[test]
    fn from_bytes_falls_back_to_base64_on_invalid_utf8() {
        let bytes = vec![0xff, 0xfe, 0x00, 0x41];
        let blob = FileBlob::from_bytes("data.txt", bytes.clone());
        assert_eq!(blob.encoding, ContentEncoding::Base64);
        assert_eq!(blob.content, BASE64.encode(&bytes));
    }

    #[test]
    fn encoding_wire_values() {
        assert_eq!(ContentEncoding::Utf8.as_str(), "utf-8");
        assert_eq!(ContentEncoding::Base64.as_str(), "base64");
    }
}
