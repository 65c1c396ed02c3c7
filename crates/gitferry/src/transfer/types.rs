//! Shared transfer types and tuning constants.

use serde::Serialize;

/// Payload size above which multi-file uploads go fully sequential.
pub const LARGE_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// File count above which multi-file uploads use small batches.
pub const SMALL_BATCH_FILE_THRESHOLD: usize = 10;

/// Files per batch in the small-batch strategy.
pub const SMALL_BATCH_SIZE: usize = 3;

/// Concurrent writes allowed in the single-pass and small-batch strategies.
pub const UPLOAD_CONCURRENCY: usize = 3;

/// Single-file size above which the contents endpoint is skipped in favor
/// of chunked commits.
pub const MAX_SINGLE_COMMIT_BYTES: usize = 1024 * 1024;

/// Bulk transfer: maximum files per tree batch.
pub const BATCH_MAX_FILES: usize = 15;

/// Bulk transfer: maximum cumulative decoded bytes per tree batch.
pub const BATCH_MAX_BYTES: usize = 800 * 1024;

/// Delay between files in the sequential-safe strategy.
pub const INTER_FILE_DELAY_MS: u64 = 500;

/// Delay between batches in the small-batch strategy and between tree
/// batches in bulk transfer.
pub const INTER_BATCH_DELAY_MS: u64 = 1_000;

/// Pause inserted after every [`DOWNLOAD_PAUSE_EVERY`] blob downloads.
pub const DOWNLOAD_PAUSE_MS: u64 = 200;

/// Number of blob downloads between pacing pauses.
pub const DOWNLOAD_PAUSE_EVERY: usize = 10;

/// One file queued for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Repo-relative path.
    pub path: String,
    /// Raw text content.
    pub content: String,
}

impl UploadFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Outcome for one file within a multi-file operation.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: String,
    pub success: bool,
    /// True when the path was excluded by the classifier before any
    /// network work.
    pub skipped: bool,
    pub error: Option<String>,
}

impl FileResult {
    pub fn ok(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: true,
            skipped: false,
            error: None,
        }
    }

    pub fn skipped(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: true,
            skipped: true,
            error: None,
        }
    }

    pub fn failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: false,
            skipped: false,
            error: Some(error.into()),
        }
    }
}

/// Result of a multi-file upload: per-file outcomes, success iff every
/// file succeeded.
#[derive(Debug, Default)]
pub struct TransferOutcome {
    pub success: bool,
    pub results: Vec<FileResult>,
}

impl TransferOutcome {
    /// Build an outcome from per-file results.
    pub fn from_results(results: Vec<FileResult>) -> Self {
        Self {
            success: results.iter().all(|r| r.success),
            results,
        }
    }

    /// Number of files that failed.
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Which comparison classes a selective transfer should apply.
#[derive(Debug, Clone, Copy)]
pub struct TransferOptions {
    pub include_new: bool,
    pub include_modified: bool,
    /// Deleted paths are surfaced by comparison but not applied unless
    /// explicitly requested.
    pub include_deleted: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            include_new: true,
            include_modified: true,
            include_deleted: false,
        }
    }
}

/// Classification of one path across two repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStatus {
    /// Present only in the source.
    New,
    /// Present in both with differing content hashes.
    Modified,
    /// Present only in the destination.
    Deleted,
    /// Present in both with the same content hash.
    Unchanged,
}

/// One path's comparison between a source and destination repository.
#[derive(Debug, Clone)]
pub struct FileComparison {
    pub path: String,
    pub status: ComparisonStatus,
    pub source_sha: Option<String>,
    pub target_sha: Option<String>,
    /// Source size minus destination size, when both listings carry sizes.
    pub size_diff: Option<i64>,
}
