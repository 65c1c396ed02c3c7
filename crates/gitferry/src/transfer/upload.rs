//! Multi-file upload strategies.
//!
//! The strategy is chosen up front from the payload (see
//! [`super::strategy`]); per-file failures are captured into the result
//! list and never abort sibling files.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::Semaphore;
use tokio::time::{Duration, sleep};

use crate::ignore::should_ignore;
use crate::remote::{PutFileResult, RemoteError, RemoteRepository};
use crate::retry::{self, RetryConfig};

use super::chunk;
use super::progress::{ProgressCallback, ProgressTracker};
use super::strategy::{TransferStrategy, select_strategy};
use super::types::{
    FileResult, INTER_BATCH_DELAY_MS, INTER_FILE_DELAY_MS, MAX_SINGLE_COMMIT_BYTES,
    SMALL_BATCH_SIZE, TransferOutcome, UPLOAD_CONCURRENCY, UploadFile,
};

/// Commit a single file, escalating to chunked commits when oversized.
///
/// The size check happens before any network call; the catch-and-escalate
/// path only remains for remote-side rejections the local check cannot
/// predict.
pub async fn commit_file<C: RemoteRepository>(
    remote: &C,
    path: &str,
    content: &str,
    message: &str,
    retry_config: &RetryConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<PutFileResult, RemoteError> {
    if content.len() > MAX_SINGLE_COMMIT_BYTES {
        tracing::debug!(
            "{} is {} bytes, committing in chunks",
            path,
            content.len()
        );
        return chunk::commit_chunked(remote, path, content, message, retry_config, on_progress)
            .await;
    }

    let branch = remote.config().branch.clone();
    let previous_sha = remote.get_file(path, &branch).await?.map(|f| f.sha);
    let encoded = BASE64.encode(content.as_bytes());

    let attempt = retry::execute(
        || remote.put_file(path, &encoded, message, previous_sha.as_deref(), &branch),
        RemoteError::retry_class,
        retry_config,
        |err, delay, attempt| {
            tracing::debug!(
                "write of {} failed (attempt {}), retrying in {:?}: {}",
                path,
                attempt,
                delay,
                err
            );
        },
    )
    .await;

    match attempt {
        Ok(result) => Ok(result),
        Err(err) if err.is_payload_too_large() => {
            tracing::warn!("{} rejected as too large, escalating to chunked commits", path);
            chunk::commit_chunked(remote, path, content, message, retry_config, on_progress).await
        }
        Err(err) => Err(err),
    }
}

/// Upload a set of files with the strategy the payload calls for.
///
/// Ignored paths are skipped before any network work. The outcome lists
/// every input file in order; `success` is true iff every non-skipped
/// file landed.
pub async fn upload_files<C>(
    remote: &C,
    files: Vec<UploadFile>,
    message: &str,
    retry_config: &RetryConfig,
    on_progress: Option<&ProgressCallback>,
) -> TransferOutcome
where
    C: RemoteRepository + Clone + 'static,
{
    let mut tracker = ProgressTracker::new(on_progress);

    let (kept, skipped): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|file| !should_ignore(&file.path));

    let mut results: Vec<FileResult> = skipped
        .iter()
        .map(|file| FileResult::skipped(&file.path))
        .collect();
    if !skipped.is_empty() {
        tracing::debug!("skipping {} ignored path(s)", skipped.len());
    }

    if kept.is_empty() {
        tracker.report(100, "Nothing to upload");
        return TransferOutcome::from_results(results);
    }

    let strategy = select_strategy(&kept);
    let total = kept.len();
    tracker.report_detail(
        2,
        format!("Uploading {total} file(s) ({strategy:?})"),
        serde_json::json!({"total": total}),
    );

    let uploaded = match strategy {
        TransferStrategy::SequentialSafe => {
            sequential_upload(remote, kept, message, retry_config, &mut tracker).await
        }
        TransferStrategy::SmallBatch => {
            batched_upload(remote, kept, message, retry_config, &mut tracker).await
        }
        TransferStrategy::SinglePass => {
            concurrent_upload(remote, kept, message, retry_config, &mut tracker).await
        }
    };
    results.extend(uploaded);

    let outcome = TransferOutcome::from_results(results);
    let failed = outcome.failed_count();
    tracker.report_detail(
        100,
        if failed == 0 {
            "Upload complete".to_string()
        } else {
            format!("Upload finished with {failed} failure(s)")
        },
        serde_json::json!({"transferred": total - failed, "total": total, "failed": failed}),
    );
    outcome
}

/// One commit per file, paced; a failure on file N leaves files 1..N
/// committed.
async fn sequential_upload<C: RemoteRepository>(
    remote: &C,
    files: Vec<UploadFile>,
    message: &str,
    retry_config: &RetryConfig,
    tracker: &mut ProgressTracker<'_>,
) -> Vec<FileResult> {
    let total = files.len();
    let mut results = Vec::with_capacity(total);

    for (index, file) in files.into_iter().enumerate() {
        let result =
            match commit_file(remote, &file.path, &file.content, message, retry_config, None).await
            {
                Ok(_) => FileResult::ok(&file.path),
                Err(err) => FileResult::failed(&file.path, err.to_string()),
            };
        results.push(result);

        report_file_progress(tracker, index + 1, total);

        if index + 1 < total {
            sleep(Duration::from_millis(INTER_FILE_DELAY_MS)).await;
        }
    }

    results
}

/// Fixed-size batches, bounded parallelism inside a batch, delay between
/// batches.
async fn batched_upload<C>(
    remote: &C,
    files: Vec<UploadFile>,
    message: &str,
    retry_config: &RetryConfig,
    tracker: &mut ProgressTracker<'_>,
) -> Vec<FileResult>
where
    C: RemoteRepository + Clone + 'static,
{
    let total = files.len();
    let batches: Vec<Vec<UploadFile>> = files
        .chunks(SMALL_BATCH_SIZE)
        .map(|chunk| chunk.to_vec())
        .collect();
    let batch_count = batches.len();

    let mut results = Vec::with_capacity(total);
    for (index, batch) in batches.into_iter().enumerate() {
        let mut batch_results =
            spawn_uploads(remote, batch, message, retry_config, UPLOAD_CONCURRENCY).await;
        results.append(&mut batch_results);

        report_file_progress(tracker, results.len(), total);

        if index + 1 < batch_count {
            sleep(Duration::from_millis(INTER_BATCH_DELAY_MS)).await;
        }
    }

    results
}

/// Everything in flight at once, bounded by the upload concurrency.
async fn concurrent_upload<C>(
    remote: &C,
    files: Vec<UploadFile>,
    message: &str,
    retry_config: &RetryConfig,
    tracker: &mut ProgressTracker<'_>,
) -> Vec<FileResult>
where
    C: RemoteRepository + Clone + 'static,
{
    let total = files.len();
    let results = spawn_uploads(remote, files, message, retry_config, UPLOAD_CONCURRENCY).await;
    report_file_progress(tracker, total, total);
    results
}

/// Spawn one upload task per file, semaphore-bounded, preserving input
/// order in the returned results.
async fn spawn_uploads<C>(
    remote: &C,
    files: Vec<UploadFile>,
    message: &str,
    retry_config: &RetryConfig,
    concurrency: usize,
) -> Vec<FileResult>
where
    C: RemoteRepository + Clone + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::with_capacity(files.len());

    for (index, file) in files.into_iter().enumerate() {
        let task_remote = remote.clone();
        let task_semaphore = Arc::clone(&semaphore);
        let task_message = message.to_string();
        let task_retry = retry_config.clone();

        let handle = tokio::spawn(async move {
            let Ok(_permit) = task_semaphore.acquire().await else {
                return (
                    index,
                    FileResult::failed(&file.path, "upload cancelled".to_string()),
                );
            };

            let result = match commit_file(
                &task_remote,
                &file.path,
                &file.content,
                &task_message,
                &task_retry,
                None,
            )
            .await
            {
                Ok(_) => FileResult::ok(&file.path),
                Err(err) => FileResult::failed(&file.path, err.to_string()),
            };
            (index, result)
        });
        handles.push(handle);
    }

    let mut indexed = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(pair) => indexed.push(pair),
            Err(join_err) => {
                tracing::warn!("upload task panicked: {join_err}");
            }
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

fn report_file_progress(tracker: &mut ProgressTracker<'_>, done: usize, total: usize) {
    // 2..=98 band; the caller owns the 100% completion event.
    let percent = 2 + ((done * 96) / total.max(1)) as u8;
    tracker.report_detail(
        percent,
        format!("Uploaded {done}/{total} file(s)"),
        serde_json::json!({"transferred": done, "total": total}),
    );
}
