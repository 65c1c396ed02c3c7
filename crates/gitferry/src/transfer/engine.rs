//! Tree-based bulk transfer between two repositories.
//!
//! Copies a source repository (or a selected subset of its paths) into a
//! destination as a sequence of batched tree commits. Batches land
//! strictly in order: each batch's tree is based on the previous commit's
//! tree and each commit parents on the previous commit, so the running
//! head threads sequentially while only blob creation inside a batch runs
//! in parallel.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::{Duration, sleep};

use crate::ignore::should_ignore;
use crate::remote::{FileBlob, NewTreeEntry, RemoteError, RemoteRepository, RemoteTreeEntry};
use crate::retry::{self, RetryConfig};

use super::progress::{ProgressCallback, ProgressTracker};
use super::strategy::partition_batches;
use super::types::{
    DOWNLOAD_PAUSE_EVERY, DOWNLOAD_PAUSE_MS, INTER_BATCH_DELAY_MS, UPLOAD_CONCURRENCY,
};

/// Options for a whole-repository transfer.
#[derive(Debug, Clone, Default)]
pub struct MirrorOptions {
    /// Clear the destination branch with an empty-tree commit before
    /// transferring.
    pub replace: bool,
    /// Only transfer paths under this prefix.
    pub path_prefix: Option<String>,
    /// Plan and report without writing to the destination.
    pub dry_run: bool,
}

/// Summary of one bulk transfer.
#[derive(Debug, Default)]
pub struct TransferReport {
    /// Files staged from the source.
    pub downloaded: usize,
    /// Source files skipped because their download failed.
    pub download_failures: usize,
    /// Paths excluded by the classifier or filters.
    pub ignored: usize,
    /// Tree batches committed.
    pub batches: usize,
    /// Files landed on the destination.
    pub files_committed: usize,
    /// Destination head after the final batch, when anything landed.
    pub head: Option<String>,
}

/// Copy the whole source repository into the destination.
pub async fn transfer_repository<S, D>(
    source: &S,
    dest: &D,
    message: &str,
    options: &MirrorOptions,
    retry_config: &RetryConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<TransferReport, RemoteError>
where
    S: RemoteRepository,
    D: RemoteRepository + Clone + 'static,
{
    let mut tracker = ProgressTracker::new(on_progress);
    let mut report = TransferReport::default();

    let entries = list_source_blobs(source, &mut tracker).await?;
    let selected: Vec<RemoteTreeEntry> = entries
        .into_iter()
        .filter(|entry| match &options.path_prefix {
            Some(prefix) => entry.path.starts_with(prefix.as_str()),
            None => true,
        })
        .collect();

    transfer_entries(source, dest, selected, message, options, retry_config, &mut tracker, &mut report)
        .await?;
    Ok(report)
}

/// Copy only the given source paths into the destination.
///
/// This is the selective mode fed by the comparison engine: the caller
/// picks which comparison classes to apply and hands over the path set.
pub async fn transfer_selected<S, D>(
    source: &S,
    dest: &D,
    paths: &HashSet<String>,
    message: &str,
    retry_config: &RetryConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<TransferReport, RemoteError>
where
    S: RemoteRepository,
    D: RemoteRepository + Clone + 'static,
{
    let mut tracker = ProgressTracker::new(on_progress);
    let mut report = TransferReport::default();

    if paths.is_empty() {
        tracker.report(100, "Nothing selected to transfer");
        return Ok(report);
    }

    let entries = list_source_blobs(source, &mut tracker).await?;
    let selected: Vec<RemoteTreeEntry> = entries
        .into_iter()
        .filter(|entry| paths.contains(&entry.path))
        .collect();

    let options = MirrorOptions::default();
    transfer_entries(source, dest, selected, message, &options, retry_config, &mut tracker, &mut report)
        .await?;
    Ok(report)
}

/// Resolve the source branch to its recursive blob listing.
async fn list_source_blobs<S: RemoteRepository>(
    source: &S,
    tracker: &mut ProgressTracker<'_>,
) -> Result<Vec<RemoteTreeEntry>, RemoteError> {
    let branch = if source.config().branch.is_empty() {
        source.default_branch().await?
    } else {
        source.config().branch.clone()
    };

    tracker.report(2, format!("Resolving {}@{branch}", source.config().full_name()));

    let head = source.branch_head(&branch).await?.ok_or_else(|| {
        RemoteError::not_found(format!(
            "branch {branch} on {}",
            source.config().full_name()
        ))
    })?;
    let tree_sha = source.commit_tree_sha(&head).await?;

    tracker.report(5, "Listing source tree");
    source.list_tree(&tree_sha).await
}

#[allow(clippy::too_many_arguments)]
async fn transfer_entries<S, D>(
    source: &S,
    dest: &D,
    entries: Vec<RemoteTreeEntry>,
    message: &str,
    options: &MirrorOptions,
    retry_config: &RetryConfig,
    tracker: &mut ProgressTracker<'_>,
    report: &mut TransferReport,
) -> Result<(), RemoteError>
where
    S: RemoteRepository,
    D: RemoteRepository + Clone + 'static,
{
    let (kept, ignored): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| !should_ignore(&entry.path));
    report.ignored = ignored.len();

    let blobs = download_blobs(source, kept, tracker, report).await;

    if options.dry_run {
        let batches = partition_batches(blobs);
        report.batches = batches.len();
        report.files_committed = batches.iter().map(|b| b.files.len()).sum();
        tracker.report_detail(
            100,
            format!(
                "Dry run: {} file(s) in {} batch(es), nothing written",
                report.files_committed, report.batches
            ),
            serde_json::json!({"batches": report.batches, "files": report.files_committed}),
        );
        return Ok(());
    }

    commit_blobs(dest, blobs, message, options.replace, retry_config, tracker, report).await?;

    tracker.report_detail(
        100,
        format!(
            "Transfer complete: {} file(s) in {} batch(es)",
            report.files_committed, report.batches
        ),
        serde_json::json!({"batches": report.batches, "files": report.files_committed}),
    );
    Ok(())
}

/// Download every blob's content, pacing requests and skipping individual
/// failures.
async fn download_blobs<S: RemoteRepository>(
    source: &S,
    entries: Vec<RemoteTreeEntry>,
    tracker: &mut ProgressTracker<'_>,
    report: &mut TransferReport,
) -> Vec<FileBlob> {
    let total = entries.len();
    let mut blobs = Vec::with_capacity(total);

    for (index, entry) in entries.into_iter().enumerate() {
        match source.fetch_blob(&entry.sha).await {
            Ok(bytes) => blobs.push(FileBlob::from_bytes(entry.path, bytes)),
            Err(err) => {
                // Partial source unavailability must not sink the pass.
                report.download_failures += 1;
                tracing::warn!("skipping {}: download failed: {}", entry.path, err);
            }
        }

        let done = index + 1;
        let percent = 5 + ((done * 35) / total.max(1)) as u8;
        tracker.report_detail(
            percent,
            format!("Downloaded {done}/{total} file(s)"),
            serde_json::json!({"transferred": done, "total": total}),
        );

        if done % DOWNLOAD_PAUSE_EVERY == 0 && done < total {
            sleep(Duration::from_millis(DOWNLOAD_PAUSE_MS)).await;
        }
    }

    report.downloaded = blobs.len();
    blobs
}

/// Land staged blobs on the destination as ordered tree batches.
async fn commit_blobs<D>(
    dest: &D,
    blobs: Vec<FileBlob>,
    message: &str,
    replace: bool,
    retry_config: &RetryConfig,
    tracker: &mut ProgressTracker<'_>,
    report: &mut TransferReport,
) -> Result<(), RemoteError>
where
    D: RemoteRepository + Clone + 'static,
{
    let branch = dest.config().branch.clone();

    // Resolve or bootstrap the destination head. The running pair of
    // (commit sha, tree sha) threads strictly sequentially from here on.
    let mut current = match dest.branch_head(&branch).await? {
        Some(head) => {
            let tree = dest.commit_tree_sha(&head).await?;
            (head, tree)
        }
        None => {
            tracker.report(42, format!("Branch {branch} does not exist, creating it"));
            bootstrap_branch(dest, &branch, retry_config).await?
        }
    };

    if replace {
        tracker.report(44, "Clearing destination branch");
        let empty_tree = dest.create_tree(None, &[]).await?;
        let commit = dest
            .create_commit("Clear branch before transfer", &empty_tree, &[current.0.clone()])
            .await?;
        dest.update_ref(&branch, &commit, false).await?;
        current = (commit, empty_tree);
    }

    let batches = partition_batches(blobs);
    let batch_count = batches.len();

    for (index, batch) in batches.into_iter().enumerate() {
        let batch_message = if batch_count > 1 {
            format!("{message} ({}/{})", index + 1, batch_count)
        } else {
            message.to_string()
        };

        let entries = create_batch_blobs(dest, &batch.files, retry_config).await?;

        let new_tree = dest.create_tree(Some(&current.1), &entries).await?;
        let new_commit = dest
            .create_commit(&batch_message, &new_tree, &[current.0.clone()])
            .await?;
        dest.update_ref(&branch, &new_commit, false).await?;

        report.files_committed += entries.len();
        report.batches += 1;
        current = (new_commit, new_tree);

        let percent = 45 + (((index + 1) * 50) / batch_count.max(1)) as u8;
        tracker.report_detail(
            percent,
            format!("Committed batch {}/{}", index + 1, batch_count),
            serde_json::json!({"batch": index + 1, "batches": batch_count}),
        );

        if index + 1 < batch_count {
            sleep(Duration::from_millis(INTER_BATCH_DELAY_MS)).await;
        }
    }

    if report.batches > 0 {
        report.head = Some(current.0);
    }
    Ok(())
}

/// Synthesize an initial empty-tree commit on a branch that does not
/// exist yet.
async fn bootstrap_branch<D: RemoteRepository>(
    dest: &D,
    branch: &str,
    retry_config: &RetryConfig,
) -> Result<(String, String), RemoteError> {
    let empty_tree = retry::execute_logged(
        || dest.create_tree(None, &[]),
        RemoteError::retry_class,
        retry_config,
        "create initial tree",
    )
    .await?;

    let commit = dest
        .create_commit("Initial commit", &empty_tree, &[])
        .await?;
    dest.update_ref(branch, &commit, false).await?;

    Ok((commit, empty_tree))
}

/// Create destination blob objects for one batch, in parallel, bounded by
/// the upload concurrency. Tree assembly waits for every blob.
async fn create_batch_blobs<D>(
    dest: &D,
    files: &[FileBlob],
    retry_config: &RetryConfig,
) -> Result<Vec<NewTreeEntry>, RemoteError>
where
    D: RemoteRepository + Clone + 'static,
{
    let semaphore = Arc::new(Semaphore::new(UPLOAD_CONCURRENCY));
    let mut handles = Vec::with_capacity(files.len());

    for (index, file) in files.iter().enumerate() {
        let task_dest = dest.clone();
        let task_semaphore = Arc::clone(&semaphore);
        let task_retry = retry_config.clone();
        let path = file.path.clone();
        let content = file.content.clone();
        let encoding = file.encoding;

        let handle = tokio::spawn(async move {
            let _permit = task_semaphore
                .acquire()
                .await
                .map_err(|_| RemoteError::internal("blob task cancelled"))?;

            let sha = retry::execute_logged(
                || task_dest.create_blob(&content, encoding),
                RemoteError::retry_class,
                &task_retry,
                "create blob",
            )
            .await?;

            Ok::<_, RemoteError>((index, NewTreeEntry { path, sha }))
        });
        handles.push(handle);
    }

    let mut entries = Vec::with_capacity(handles.len());
    for handle in handles {
        let (index, entry) = handle
            .await
            .map_err(|e| RemoteError::internal(format!("blob task panicked: {e}")))??;
        entries.push((index, entry));
    }

    entries.sort_by_key(|(index, _)| *index);
    Ok(entries.into_iter().map(|(_, entry)| entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_options_default_is_additive() {
        let options = MirrorOptions::default();
        assert!(!options.replace);
        assert!(!options.dry_run);
        assert!(options.path_prefix.is_none());
    }

    #[test]
    fn report_starts_empty() {
        let report = TransferReport::default();
        assert_eq!(report.batches, 0);
        assert!(report.head.is_none());
    }
}
