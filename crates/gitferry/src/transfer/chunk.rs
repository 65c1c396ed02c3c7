//! Chunked commits for oversized files.
//!
//! A file too large for one write is committed as a sequence of growing
//! line-prefix snapshots: every intermediate commit holds a prefix of the
//! original, the final commit holds the complete content, and each write
//! threads the previous write's content sha as its precondition. Partial
//! progress stays in history if a later chunk fails; there is no
//! rollback.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::time::{Duration, sleep};

use crate::remote::{PutFileResult, RemoteError, RemoteRepository};
use crate::retry::{self, RetryConfig};

use super::progress::{ProgressCallback, ProgressTracker};

/// Target bytes of new content per chunk in the standard strategy.
pub const DEFAULT_CHUNK_BYTES: usize = 100 * 1024;

/// Target bytes per chunk in the ultra-small fallback.
pub const ULTRA_CHUNK_BYTES: usize = 50 * 1024;

/// Lines per step in the last-resort strategy.
pub const CHUNK_LINE_STEP: usize = 50;

/// Delay between consecutive chunk commits.
pub const CHUNK_COMMIT_DELAY_MS: u64 = 500;

/// How a file is sliced into growing prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Grow by whole lines until roughly `target_bytes` of new content
    /// accumulated since the previous chunk.
    ByteBudget { target_bytes: usize },
    /// Grow by a fixed number of lines per step.
    LineCount { lines_per_step: usize },
}

/// Escalation order: standard, ultra-small, then line-count as the last
/// resort. A strategy that fails mid-flight hands over to the next.
pub fn escalation_ladder() -> [ChunkStrategy; 3] {
    [
        ChunkStrategy::ByteBudget {
            target_bytes: DEFAULT_CHUNK_BYTES,
        },
        ChunkStrategy::ByteBudget {
            target_bytes: ULTRA_CHUNK_BYTES,
        },
        ChunkStrategy::LineCount {
            lines_per_step: CHUNK_LINE_STEP,
        },
    ]
}

/// Slice content into cumulative prefixes.
///
/// Every element is a prefix of the original ending on a line boundary
/// (except the final element, which is always the complete content
/// byte-for-byte). Each element extends the previous one, so the remote
/// history shows monotonically growing content.
pub fn plan_chunks(content: &str, strategy: ChunkStrategy) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut prefix_len = 0usize;

    match strategy {
        ChunkStrategy::ByteBudget { target_bytes } => {
            let mut step_bytes = 0usize;
            for line in content.split_inclusive('\n') {
                prefix_len += line.len();
                step_bytes += line.len();
                if step_bytes >= target_bytes {
                    chunks.push(content[..prefix_len].to_string());
                    step_bytes = 0;
                }
            }
        }
        ChunkStrategy::LineCount { lines_per_step } => {
            let step = lines_per_step.max(1);
            for (index, line) in content.split_inclusive('\n').enumerate() {
                prefix_len += line.len();
                if (index + 1) % step == 0 {
                    chunks.push(content[..prefix_len].to_string());
                }
            }
        }
    }

    if chunks.last().map(String::as_str) != Some(content) {
        chunks.push(content.to_string());
    }

    chunks
}

/// Commit one oversized file as a sequence of chunk commits.
///
/// Tries each strategy on the escalation ladder in order; a strategy
/// whose chunk fails after its own bounded retries hands over to the
/// next, and the last failure propagates when the ladder is exhausted.
/// Returns the final write's result.
pub async fn commit_chunked<C: RemoteRepository>(
    remote: &C,
    path: &str,
    content: &str,
    message: &str,
    retry_config: &RetryConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<PutFileResult, RemoteError> {
    let ladder = escalation_ladder();
    let last_index = ladder.len() - 1;

    // One tracker across the whole ladder: a restarted strategy must not
    // rewind the caller's progress stream.
    let mut tracker = ProgressTracker::new(on_progress);

    for (index, strategy) in ladder.into_iter().enumerate() {
        match commit_with_strategy(remote, path, content, message, strategy, retry_config, &mut tracker)
            .await
        {
            Ok(result) => return Ok(result),
            Err(err) if index < last_index => {
                tracing::warn!(
                    "chunk strategy {:?} failed for {}, escalating: {}",
                    strategy,
                    path,
                    err
                );
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("escalation ladder is non-empty")
}

async fn commit_with_strategy<C: RemoteRepository>(
    remote: &C,
    path: &str,
    content: &str,
    message: &str,
    strategy: ChunkStrategy,
    retry_config: &RetryConfig,
    tracker: &mut ProgressTracker<'_>,
) -> Result<PutFileResult, RemoteError> {
    let chunks = plan_chunks(content, strategy);
    let total = chunks.len();
    let branch = remote.config().branch.clone();

    // The first write's precondition is the file's current sha, if any.
    let mut previous_sha = remote.get_file(path, &branch).await?.map(|f| f.sha);
    let mut last_result = None;

    for (index, chunk) in chunks.iter().enumerate() {
        let is_final = index + 1 == total;
        let chunk_message = if is_final {
            message.to_string()
        } else {
            format!("{message} [chunk {}/{}]", index + 1, total)
        };

        let encoded = BASE64.encode(chunk.as_bytes());
        let result = retry::execute(
            || remote.put_file(path, &encoded, &chunk_message, previous_sha.as_deref(), &branch),
            RemoteError::retry_class,
            retry_config,
            |err, delay, attempt| {
                tracing::debug!(
                    "chunk {}/{} of {} failed (attempt {}), retrying in {:?}: {}",
                    index + 1,
                    total,
                    path,
                    attempt,
                    delay,
                    err
                );
            },
        )
        .await
        .inspect_err(|err| {
            tracing::warn!("chunk {}/{} of {} failed: {}", index + 1, total, path, err);
        })?;

        previous_sha = Some(result.content_sha.clone());
        last_result = Some(result);

        let percent = (((index + 1) * 100) / total) as u8;
        tracker.report_detail(
            percent,
            format!("Committed chunk {}/{} of {path}", index + 1, total),
            serde_json::json!({"transferred": index + 1, "total": total}),
        );

        if !is_final {
            sleep(Duration::from_millis(CHUNK_COMMIT_DELAY_MS)).await;
        }
    }

    last_result.ok_or_else(|| RemoteError::internal(format!("no chunks planned for {path}")))
}
