//! Path-level comparison between two repositories.
//!
//! Builds path→hash maps from both recursive trees and classifies every
//! path present on either side. Pure apart from the two tree fetches; a
//! fetch failure propagates so the caller can fall back to a full
//! transfer.

use std::collections::HashMap;

use crate::remote::{RemoteError, RemoteRepository, RemoteTreeEntry};

use super::progress::{ProgressCallback, ProgressTracker};
use super::types::{ComparisonStatus, FileComparison};

/// Compare the source repository against the destination.
///
/// Returns one entry per path present in either repository, sorted by
/// path. Deleted paths (present only in the destination) are surfaced for
/// the caller to decide on; nothing is applied here.
pub async fn compare_repositories<S, D>(
    source: &S,
    dest: &D,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<FileComparison>, RemoteError>
where
    S: RemoteRepository,
    D: RemoteRepository,
{
    let mut tracker = ProgressTracker::new(on_progress);

    tracker.report(5, format!("Listing {}", source.config().full_name()));
    let source_entries = fetch_tree(source).await?;
    tracker.report(40, format!("Listing {}", dest.config().full_name()));
    let dest_entries = fetch_tree(dest).await?;

    tracker.report(80, "Comparing trees");
    let comparisons = classify_paths(&source_entries, &dest_entries);

    let changed = comparisons
        .iter()
        .filter(|c| c.status != ComparisonStatus::Unchanged)
        .count();
    tracker.report_detail(
        100,
        format!("Compared {} path(s), {} differ", comparisons.len(), changed),
        serde_json::json!({"total": comparisons.len(), "changed": changed}),
    );

    Ok(comparisons)
}

async fn fetch_tree<R: RemoteRepository>(
    remote: &R,
) -> Result<HashMap<String, RemoteTreeEntry>, RemoteError> {
    let branch = if remote.config().branch.is_empty() {
        remote.default_branch().await?
    } else {
        remote.config().branch.clone()
    };

    // An absent branch compares as an empty tree: everything on the other
    // side is new (or deleted), which is exactly what a first transfer
    // needs to see.
    let Some(head) = remote.branch_head(&branch).await? else {
        return Ok(HashMap::new());
    };

    let tree_sha = remote.commit_tree_sha(&head).await?;
    let entries = remote.list_tree(&tree_sha).await?;

    Ok(entries
        .into_iter()
        .map(|entry| (entry.path.clone(), entry))
        .collect())
}

/// Classify every path present in either map.
///
/// Each path lands in exactly one class, consistent with hash equality:
/// source-only paths are new, destination-only paths are deleted, shared
/// paths are modified or unchanged by sha comparison.
pub fn classify_paths(
    source: &HashMap<String, RemoteTreeEntry>,
    dest: &HashMap<String, RemoteTreeEntry>,
) -> Vec<FileComparison> {
    let mut comparisons = Vec::with_capacity(source.len().max(dest.len()));

    for (path, source_entry) in source {
        match dest.get(path) {
            None => comparisons.push(FileComparison {
                path: path.clone(),
                status: ComparisonStatus::New,
                source_sha: Some(source_entry.sha.clone()),
                target_sha: None,
                size_diff: source_entry.size.map(|s| s as i64),
            }),
            Some(dest_entry) => {
                let status = if source_entry.sha == dest_entry.sha {
                    ComparisonStatus::Unchanged
                } else {
                    ComparisonStatus::Modified
                };
                comparisons.push(FileComparison {
                    path: path.clone(),
                    status,
                    source_sha: Some(source_entry.sha.clone()),
                    target_sha: Some(dest_entry.sha.clone()),
                    size_diff: match (source_entry.size, dest_entry.size) {
                        (Some(s), Some(d)) => Some(s as i64 - d as i64),
                        _ => None,
                    },
                });
            }
        }
    }

    for (path, dest_entry) in dest {
        if !source.contains_key(path) {
            comparisons.push(FileComparison {
                path: path.clone(),
                status: ComparisonStatus::Deleted,
                source_sha: None,
                target_sha: Some(dest_entry.sha.clone()),
                size_diff: dest_entry.size.map(|s| -(s as i64)),
            });
        }
    }

    comparisons.sort_by(|a, b| a.path.cmp(&b.path));
    comparisons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, sha: &str, size: u64) -> (String, RemoteTreeEntry) {
        (
            path.to_string(),
            RemoteTreeEntry {
                path: path.to_string(),
                sha: sha.to_string(),
                size: Some(size),
            },
        )
    }

    #[test]
    fn classifies_new_deleted_unchanged() {
        let source: HashMap<_, _> = [entry("a.txt", "hashA", 10), entry("b.txt", "hashB", 20)]
            .into_iter()
            .collect();
        let dest: HashMap<_, _> = [entry("a.txt", "hashA", 10), entry("c.txt", "hashC", 30)]
            .into_iter()
            .collect();

        let comparisons = classify_paths(&source, &dest);
        assert_eq!(comparisons.len(), 3);

        let by_path: HashMap<&str, ComparisonStatus> = comparisons
            .iter()
            .map(|c| (c.path.as_str(), c.status))
            .collect();
        assert_eq!(by_path["a.txt"], ComparisonStatus::Unchanged);
        assert_eq!(by_path["b.txt"], ComparisonStatus::New);
        assert_eq!(by_path["c.txt"], ComparisonStatus::Deleted);
    }

    #[test]
    fn modified_requires_differing_hashes() {
        let source: HashMap<_, _> = [entry("f.rs", "new-hash", 120)].into_iter().collect();
        let dest: HashMap<_, _> = [entry("f.rs", "old-hash", 100)].into_iter().collect();

        let comparisons = classify_paths(&source, &dest);
        assert_eq!(comparisons.len(), 1);
        assert_eq!(comparisons[0].status, ComparisonStatus::Modified);
        assert_eq!(comparisons[0].size_diff, Some(20));
        assert_eq!(comparisons[0].source_sha.as_deref(), Some("new-hash"));
        assert_eq!(comparisons[0].target_sha.as_deref(), Some("old-hash"));
    }

    #[test]
    fn every_path_lands_in_exactly_one_class() {
        let source: HashMap<_, _> = (0..20)
            .map(|i| entry(&format!("s{i}.txt"), &format!("h{i}"), i))
            .chain((0..10).map(|i| entry(&format!("shared{i}"), "same", i)))
            .collect();
        let dest: HashMap<_, _> = (0..15)
            .map(|i| entry(&format!("d{i}.txt"), &format!("h{i}"), i))
            .chain((0..10).map(|i| entry(&format!("shared{i}"), "same", i)))
            .collect();

        let comparisons = classify_paths(&source, &dest);

        // One entry per distinct path.
        let mut paths: Vec<&str> = comparisons.iter().map(|c| c.path.as_str()).collect();
        paths.dedup();
        assert_eq!(paths.len(), comparisons.len());
        assert_eq!(comparisons.len(), 20 + 15 + 10);

        for comparison in &comparisons {
            match comparison.status {
                ComparisonStatus::New => {
                    assert!(comparison.source_sha.is_some() && comparison.target_sha.is_none());
                }
                ComparisonStatus::Deleted => {
                    assert!(comparison.source_sha.is_none() && comparison.target_sha.is_some());
                }
                ComparisonStatus::Modified => {
                    assert_ne!(comparison.source_sha, comparison.target_sha);
                }
                ComparisonStatus::Unchanged => {
                    assert_eq!(comparison.source_sha, comparison.target_sha);
                }
            }
        }
    }

    #[test]
    fn results_are_sorted_by_path() {
        let source: HashMap<_, _> = [entry("z.txt", "h1", 1), entry("a.txt", "h2", 1)]
            .into_iter()
            .collect();
        let dest = HashMap::new();

        let comparisons = classify_paths(&source, &dest);
        let paths: Vec<&str> = comparisons.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "z.txt"]);
    }

    #[test]
    fn empty_maps_compare_to_nothing() {
        let comparisons = classify_paths(&HashMap::new(), &HashMap::new());
        assert!(comparisons.is_empty());
    }
}
