//! Integration tests for transfer operations against an in-memory remote.
//!
//! The mock remote models the git object store the engine talks to:
//! content-addressed blobs, trees, commits, branch refs, and the
//! contents endpoint used by chunked commits. Failure injection covers
//! the retry and escalation paths.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use gitferry::remote::{
    CommitSummary, ContentEncoding, ExistingFile, NewTreeEntry, PutFileResult, RemoteError,
    RemoteRepository, RemoteTreeEntry, RepositoryConfig,
};
use gitferry::retry::RetryConfig;
use gitferry::transfer::{
    self, ComparisonStatus, MirrorOptions, ProgressCallback, ProgressEvent, TransferOptions,
    UploadFile,
};

fn sha_of(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[derive(Debug, Clone)]
struct MockCommit {
    tree: String,
    parents: Vec<String>,
    message: String,
}

#[derive(Debug, Default)]
struct MockState {
    blobs: HashMap<String, Vec<u8>>,
    /// tree sha -> entries (path -> blob sha)
    trees: HashMap<String, Vec<(String, String)>>,
    commits: HashMap<String, MockCommit>,
    refs: HashMap<String, String>,
    /// Failures to inject into put_file, consumed front to back.
    put_failures: Vec<RemoteError>,
    put_calls: usize,
}

/// In-memory remote repository.
#[derive(Clone)]
struct MockRemote {
    config: RepositoryConfig,
    state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    fn new(owner: &str, repo: &str) -> Self {
        Self {
            config: RepositoryConfig::new("test-token", owner, repo),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a branch with the given files as its head tree.
    fn seed_branch(&self, branch: &str, files: &[(&str, &str)]) {
        let mut state = self.lock();
        let mut entries = Vec::new();
        for (path, content) in files {
            let sha = sha_of(content.as_bytes());
            state.blobs.insert(sha.clone(), content.as_bytes().to_vec());
            entries.push((path.to_string(), sha));
        }
        let tree_sha = sha_of(format!("{entries:?}").as_bytes());
        state.trees.insert(tree_sha.clone(), entries);
        let commit_sha = sha_of(format!("seed:{tree_sha}").as_bytes());
        state.commits.insert(
            commit_sha.clone(),
            MockCommit {
                tree: tree_sha,
                parents: Vec::new(),
                message: "seed".to_string(),
            },
        );
        state.refs.insert(branch.to_string(), commit_sha);
    }

    fn inject_put_failures(&self, failures: Vec<RemoteError>) {
        self.lock().put_failures = failures;
    }

    fn head_of(&self, branch: &str) -> Option<String> {
        self.lock().refs.get(branch).cloned()
    }

    fn commit(&self, sha: &str) -> MockCommit {
        self.lock().commits.get(sha).expect("commit exists").clone()
    }

    /// Decoded content of a path at a branch head, if present.
    fn file_at_head(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.lock();
        let head = state.refs.get(branch)?;
        let commit = state.commits.get(head)?;
        let entries = state.trees.get(&commit.tree)?;
        let (_, blob_sha) = entries.iter().find(|(p, _)| p == path)?;
        state.blobs.get(blob_sha).cloned()
    }

    /// Walk first parents from a branch head back to the root.
    fn history(&self, branch: &str) -> Vec<(String, MockCommit)> {
        let state = self.lock();
        let mut shas = Vec::new();
        let mut cursor = state.refs.get(branch).cloned();
        while let Some(sha) = cursor {
            let commit = state.commits.get(&sha).expect("commit exists").clone();
            cursor = commit.parents.first().cloned();
            shas.push((sha, commit));
        }
        shas
    }
}

#[async_trait]
impl RemoteRepository for MockRemote {
    fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    async fn default_branch(&self) -> Result<String, RemoteError> {
        Ok("main".to_string())
    }

    async fn branch_head(&self, branch: &str) -> Result<Option<String>, RemoteError> {
        Ok(self.lock().refs.get(branch).cloned())
    }

    async fn commit_tree_sha(&self, commit_sha: &str) -> Result<String, RemoteError> {
        self.lock()
            .commits
            .get(commit_sha)
            .map(|c| c.tree.clone())
            .ok_or_else(|| RemoteError::not_found(format!("commit {commit_sha}")))
    }

    async fn list_tree(&self, tree_sha: &str) -> Result<Vec<RemoteTreeEntry>, RemoteError> {
        let state = self.lock();
        let entries = state
            .trees
            .get(tree_sha)
            .ok_or_else(|| RemoteError::not_found(format!("tree {tree_sha}")))?;
        Ok(entries
            .iter()
            .map(|(path, sha)| RemoteTreeEntry {
                path: path.clone(),
                sha: sha.clone(),
                size: state.blobs.get(sha).map(|b| b.len() as u64),
            })
            .collect())
    }

    async fn fetch_blob(&self, sha: &str) -> Result<Vec<u8>, RemoteError> {
        self.lock()
            .blobs
            .get(sha)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(format!("blob {sha}")))
    }

    async fn create_blob(
        &self,
        content: &str,
        encoding: ContentEncoding,
    ) -> Result<String, RemoteError> {
        let bytes = match encoding {
            ContentEncoding::Utf8 => content.as_bytes().to_vec(),
            ContentEncoding::Base64 => BASE64
                .decode(content.as_bytes())
                .map_err(|e| RemoteError::internal(format!("bad base64: {e}")))?,
        };
        let sha = sha_of(&bytes);
        self.lock().blobs.insert(sha.clone(), bytes);
        Ok(sha)
    }

    async fn create_tree(
        &self,
        base_tree: Option<&str>,
        entries: &[NewTreeEntry],
    ) -> Result<String, RemoteError> {
        let mut state = self.lock();

        let mut merged: Vec<(String, String)> = match base_tree {
            Some(base) => state
                .trees
                .get(base)
                .ok_or_else(|| RemoteError::not_found(format!("tree {base}")))?
                .clone(),
            None => Vec::new(),
        };

        for entry in entries {
            if !state.blobs.contains_key(&entry.sha) {
                return Err(RemoteError::not_found(format!("blob {}", entry.sha)));
            }
            merged.retain(|(path, _)| path != &entry.path);
            merged.push((entry.path.clone(), entry.sha.clone()));
        }
        merged.sort();

        let sha = sha_of(format!("{merged:?}").as_bytes());
        state.trees.insert(sha.clone(), merged);
        Ok(sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> Result<String, RemoteError> {
        let mut state = self.lock();
        if !state.trees.contains_key(tree_sha) {
            return Err(RemoteError::not_found(format!("tree {tree_sha}")));
        }
        let sha = sha_of(format!("{message}:{tree_sha}:{parents:?}").as_bytes());
        state.commits.insert(
            sha.clone(),
            MockCommit {
                tree: tree_sha.to_string(),
                parents: parents.to_vec(),
                message: message.to_string(),
            },
        );
        Ok(sha)
    }

    async fn update_ref(
        &self,
        branch: &str,
        commit_sha: &str,
        _force: bool,
    ) -> Result<(), RemoteError> {
        let mut state = self.lock();
        if !state.commits.contains_key(commit_sha) {
            return Err(RemoteError::not_found(format!("commit {commit_sha}")));
        }
        state.refs.insert(branch.to_string(), commit_sha.to_string());
        Ok(())
    }

    async fn get_file(
        &self,
        path: &str,
        branch: &str,
    ) -> Result<Option<ExistingFile>, RemoteError> {
        let state = self.lock();
        let Some(head) = state.refs.get(branch) else {
            return Ok(None);
        };
        let commit = state
            .commits
            .get(head)
            .ok_or_else(|| RemoteError::internal("dangling ref"))?;
        let entries = state
            .trees
            .get(&commit.tree)
            .ok_or_else(|| RemoteError::internal("dangling tree"))?;
        Ok(entries.iter().find(|(p, _)| p == path).map(|(_, sha)| {
            let size = state.blobs.get(sha).map(|b| b.len() as u64).unwrap_or(0);
            ExistingFile {
                sha: sha.clone(),
                size,
            }
        }))
    }

    async fn put_file(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        previous_sha: Option<&str>,
        branch: &str,
    ) -> Result<PutFileResult, RemoteError> {
        // Failure injection for retry/escalation tests.
        {
            let mut state = self.lock();
            state.put_calls += 1;
            if !state.put_failures.is_empty() {
                return Err(state.put_failures.remove(0));
            }
        }

        let bytes = BASE64
            .decode(content_base64.as_bytes())
            .map_err(|e| RemoteError::internal(format!("bad base64: {e}")))?;

        // Optimistic concurrency: the caller's sha must match the file's
        // current state.
        let current = self.get_file(path, branch).await?;
        match (&current, previous_sha) {
            (Some(existing), Some(given)) if existing.sha != given => {
                return Err(RemoteError::api(format!(
                    "sha mismatch for {path}: expected {}, got {given}",
                    existing.sha
                )));
            }
            (Some(_), None) => {
                return Err(RemoteError::api(format!(
                    "{path} exists but no sha was supplied"
                )));
            }
            (None, Some(_)) => {
                return Err(RemoteError::api(format!("{path} does not exist")));
            }
            _ => {}
        }

        let blob_sha = sha_of(&bytes);
        let mut state = self.lock();
        state.blobs.insert(blob_sha.clone(), bytes);

        let head = state.refs.get(branch).cloned();
        let mut entries: Vec<(String, String)> = match &head {
            Some(head) => {
                let tree = state.commits.get(head).expect("head commit").tree.clone();
                state.trees.get(&tree).expect("head tree").clone()
            }
            None => Vec::new(),
        };
        entries.retain(|(p, _)| p != path);
        entries.push((path.to_string(), blob_sha.clone()));
        entries.sort();

        let tree_sha = sha_of(format!("{entries:?}").as_bytes());
        state.trees.insert(tree_sha.clone(), entries);

        let parents: Vec<String> = head.into_iter().collect();
        let commit_sha = sha_of(format!("{message}:{tree_sha}:{parents:?}").as_bytes());
        state.commits.insert(
            commit_sha.clone(),
            MockCommit {
                tree: tree_sha,
                parents,
                message: message.to_string(),
            },
        );
        state.refs.insert(branch.to_string(), commit_sha.clone());

        Ok(PutFileResult {
            content_sha: blob_sha,
            commit_sha,
        })
    }

    async fn list_commits(
        &self,
        branch: &str,
        limit: usize,
    ) -> Result<Vec<CommitSummary>, RemoteError> {
        Ok(self
            .history(branch)
            .into_iter()
            .take(limit)
            .map(|(sha, commit)| CommitSummary {
                sha,
                message: commit.message,
                author: Some("mock".to_string()),
                date: None,
                url: None,
            })
            .collect())
    }
}

/// Fast retry config so injected failures do not slow the suite down.
fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        rate_limit_base: std::time::Duration::from_millis(1),
        transient_base: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(10),
    }
}

fn recording_progress() -> (ProgressCallback, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let capture = Arc::clone(&events);
    let callback: ProgressCallback = Box::new(move |event| {
        capture.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    });
    (callback, events)
}

fn text_of_lines(count: usize) -> String {
    (0..count)
        .map(|i| format!("line {i:06} with some padding to give it realistic width\n"))
        .collect()
}

// ─── Chunked commits ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn oversized_file_lands_complete_via_chunked_commits() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[("README.md", "readme\n")]);

    // ~3 MB of text forces the chunked path.
    let content = text_of_lines(55_000);
    assert!(content.len() > 2 * 1024 * 1024);

    let result = transfer::commit_file(
        &remote,
        "telemetry/dump.csv",
        &content,
        "Import telemetry dump",
        &fast_retry(),
        None,
    )
    .await
    .expect("chunked commit succeeds");

    // Final content is byte-for-byte the original.
    let stored = remote.file_at_head("main", "telemetry/dump.csv").unwrap();
    assert_eq!(stored, content.as_bytes());

    // The history shows annotated intermediate chunks under the final
    // unannotated message.
    let history = remote.history("main");
    assert_eq!(history[0].0, result.commit_sha);
    assert_eq!(history[0].1.message, "Import telemetry dump");
    assert!(history[1].1.message.contains("[chunk"));
    assert!(history.len() > 3);
}

#[tokio::test(start_paused = true)]
async fn chunked_commit_creates_file_on_fresh_branch() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[]);

    let content = text_of_lines(30_000);
    transfer::commit_file(&remote, "big.txt", &content, "Add big file", &fast_retry(), None)
        .await
        .expect("commit succeeds");

    assert_eq!(
        remote.file_at_head("main", "big.txt").unwrap(),
        content.as_bytes()
    );
}

#[tokio::test(start_paused = true)]
async fn small_file_is_a_single_standard_commit() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[]);

    transfer::commit_file(&remote, "notes.md", "hello\n", "Add notes", &fast_retry(), None)
        .await
        .expect("commit succeeds");

    let history = remote.history("main");
    // Seedless branch state: one seed tree commit plus the single write.
    assert_eq!(history[0].1.message, "Add notes");
    assert_eq!(
        remote.file_at_head("main", "notes.md").unwrap(),
        b"hello\n"
    );
}

#[tokio::test(start_paused = true)]
async fn transient_put_failures_are_retried_through() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[]);
    remote.inject_put_failures(vec![
        RemoteError::RateLimited { reset_at: None },
        RemoteError::network("connection reset"),
    ]);

    transfer::commit_file(&remote, "a.txt", "content\n", "Add a", &fast_retry(), None)
        .await
        .expect("third attempt succeeds");

    assert_eq!(remote.file_at_head("main", "a.txt").unwrap(), b"content\n");
    assert_eq!(remote.lock().put_calls, 3);
}

#[tokio::test(start_paused = true)]
async fn permission_failure_surfaces_without_retry() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[]);
    remote.inject_put_failures(vec![RemoteError::permission("token lacks repo scope")]);

    let err = transfer::commit_file(&remote, "a.txt", "content\n", "Add a", &fast_retry(), None)
        .await
        .expect_err("permission error is terminal");

    assert!(matches!(err, RemoteError::PermissionDenied { .. }));
    assert_eq!(remote.lock().put_calls, 1);
}

#[tokio::test(start_paused = true)]
async fn remote_size_rejection_escalates_to_chunked() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[]);
    // Small enough for the standard path, but the remote rejects it once.
    remote.inject_put_failures(vec![RemoteError::payload_too_large("weird.bin")]);

    let content = text_of_lines(400);
    transfer::commit_file(&remote, "weird.bin", &content, "Add file", &fast_retry(), None)
        .await
        .expect("escalation lands the file");

    assert_eq!(
        remote.file_at_head("main", "weird.bin").unwrap(),
        content.as_bytes()
    );
}

// ─── Multi-file upload ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn twenty_five_files_upload_in_small_batches() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[]);

    // 25 files of ~20 KB: small-batch territory.
    let files: Vec<UploadFile> = (0..25)
        .map(|i| UploadFile::new(format!("src/part{i:02}.rs"), text_of_lines(350)))
        .collect();

    let (callback, events) = recording_progress();
    let outcome = transfer::upload_files(
        &remote,
        files,
        "Bulk import",
        &fast_retry(),
        Some(&callback),
    )
    .await;

    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 25);
    assert!(outcome.results.iter().all(|r| r.success && !r.skipped));

    for i in 0..25 {
        assert!(
            remote
                .file_at_head("main", &format!("src/part{i:02}.rs"))
                .is_some()
        );
    }

    // Progress is monotonic and finishes at 100.
    let events = events.lock().unwrap();
    let percents: Vec<u8> = events.iter().map(|e| e.percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test(start_paused = true)]
async fn per_file_failures_do_not_abort_siblings() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[]);
    // Exhaust retries for exactly one file's attempts.
    remote.inject_put_failures(vec![
        RemoteError::permission("no write access"),
    ]);

    let files = vec![
        UploadFile::new("one.txt", "1\n"),
        UploadFile::new("two.txt", "2\n"),
        UploadFile::new("three.txt", "3\n"),
    ];

    let outcome = transfer::upload_files(&remote, files, "Add files", &fast_retry(), None).await;

    assert!(!outcome.success);
    assert_eq!(outcome.failed_count(), 1);
    assert_eq!(outcome.results.len(), 3);

    let failed: Vec<&str> = outcome
        .results
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.path.as_str())
        .collect();
    assert_eq!(failed.len(), 1);

    // The two successful writes landed.
    let landed = ["one.txt", "two.txt", "three.txt"]
        .iter()
        .filter(|p| remote.file_at_head("main", p).is_some())
        .count();
    assert_eq!(landed, 2);
}

#[tokio::test(start_paused = true)]
async fn ignored_paths_are_skipped_before_any_network_work() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[]);

    let files = vec![
        UploadFile::new("src/main.rs", "fn main() {}\n"),
        UploadFile::new(".env", "SECRET=1\n"),
        UploadFile::new("node_modules/x/index.js", "x\n"),
    ];

    let outcome = transfer::upload_files(&remote, files, "Add source", &fast_retry(), None).await;

    assert!(outcome.success);
    let skipped: Vec<&str> = outcome
        .results
        .iter()
        .filter(|r| r.skipped)
        .map(|r| r.path.as_str())
        .collect();
    assert_eq!(skipped.len(), 2);

    assert!(remote.file_at_head("main", "src/main.rs").is_some());
    assert!(remote.file_at_head("main", ".env").is_none());
    assert!(remote.file_at_head("main", "node_modules/x/index.js").is_none());
}

// ─── Comparison ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comparison_classifies_both_sides() {
    let source = MockRemote::new("acme", "firmware");
    source.seed_branch("main", &[("a.txt", "alpha"), ("b.txt", "beta")]);

    let dest = MockRemote::new("acme", "mirror");
    dest.seed_branch("main", &[("a.txt", "alpha"), ("c.txt", "gamma")]);

    let comparisons = transfer::compare_repositories(&source, &dest, None)
        .await
        .expect("comparison succeeds");

    let by_path: HashMap<&str, ComparisonStatus> = comparisons
        .iter()
        .map(|c| (c.path.as_str(), c.status))
        .collect();
    assert_eq!(by_path.len(), 3);
    assert_eq!(by_path["a.txt"], ComparisonStatus::Unchanged);
    assert_eq!(by_path["b.txt"], ComparisonStatus::New);
    assert_eq!(by_path["c.txt"], ComparisonStatus::Deleted);
}

#[tokio::test]
async fn comparison_against_missing_branch_sees_everything_as_new() {
    let source = MockRemote::new("acme", "firmware");
    source.seed_branch("main", &[("a.txt", "alpha")]);

    let dest = MockRemote::new("acme", "mirror"); // no branch seeded

    let comparisons = transfer::compare_repositories(&source, &dest, None)
        .await
        .expect("comparison succeeds");

    assert_eq!(comparisons.len(), 1);
    assert_eq!(comparisons[0].status, ComparisonStatus::New);
}

// ─── Bulk transfer ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn bulk_transfer_batches_thread_sequentially() {
    let source = MockRemote::new("acme", "firmware");
    // 40 files forces multiple batches (15 per batch).
    let contents: Vec<(String, String)> = (0..40)
        .map(|i| (format!("src/file{i:02}.rs"), format!("// file {i}\n")))
        .collect();
    let refs: Vec<(&str, &str)> = contents
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();
    source.seed_branch("main", &refs);

    let dest = MockRemote::new("acme", "mirror");
    dest.seed_branch("main", &[("existing.md", "keep me")]);

    let (callback, events) = recording_progress();
    let report = transfer::transfer_repository(
        &source,
        &dest,
        "Mirror firmware",
        &MirrorOptions::default(),
        &fast_retry(),
        Some(&callback),
    )
    .await
    .expect("transfer succeeds");

    assert_eq!(report.downloaded, 40);
    assert_eq!(report.batches, 3); // 15 + 15 + 10
    assert_eq!(report.files_committed, 40);

    // The head is the last batch's commit and parents chain strictly
    // backwards, one commit per batch, each batch's tree based on its
    // parent commit's tree.
    let head = report.head.clone().expect("head set");
    assert_eq!(dest.head_of("main"), Some(head.clone()));

    let mut cursor = head;
    for _ in 0..report.batches {
        let commit = dest.commit(&cursor);
        assert_eq!(commit.parents.len(), 1);
        cursor = commit.parents[0].clone();
    }
    // After the batch chain we are back at the seeded commit.
    assert_eq!(dest.commit(&cursor).message, "seed");

    // Additive transfer: pre-existing destination files survive.
    assert!(dest.file_at_head("main", "existing.md").is_some());
    assert_eq!(
        dest.file_at_head("main", "src/file00.rs").unwrap(),
        b"// file 0\n"
    );

    let events = events.lock().unwrap();
    let percents: Vec<u8> = events.iter().map(|e| e.percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test(start_paused = true)]
async fn bulk_transfer_bootstraps_missing_destination_branch() {
    let source = MockRemote::new("acme", "firmware");
    source.seed_branch("main", &[("a.txt", "alpha"), ("b.txt", "beta")]);

    let dest = MockRemote::new("acme", "mirror"); // branch absent

    let report = transfer::transfer_repository(
        &source,
        &dest,
        "First mirror",
        &MirrorOptions::default(),
        &fast_retry(),
        None,
    )
    .await
    .expect("transfer succeeds");

    // The branch now exists, pointing at the final batch commit, with the
    // synthesized initial commit at the root.
    assert_eq!(dest.head_of("main"), report.head);
    let history = dest.history("main");
    assert_eq!(history.last().unwrap().1.message, "Initial commit");
    assert!(dest.file_at_head("main", "a.txt").is_some());
    assert!(dest.file_at_head("main", "b.txt").is_some());
}

#[tokio::test(start_paused = true)]
async fn replace_mode_clears_destination_first() {
    let source = MockRemote::new("acme", "firmware");
    source.seed_branch("main", &[("new.txt", "new content")]);

    let dest = MockRemote::new("acme", "mirror");
    dest.seed_branch("main", &[("stale.txt", "old content")]);

    let options = MirrorOptions {
        replace: true,
        ..MirrorOptions::default()
    };
    transfer::transfer_repository(&source, &dest, "Replace mirror", &options, &fast_retry(), None)
        .await
        .expect("transfer succeeds");

    assert!(dest.file_at_head("main", "new.txt").is_some());
    assert!(dest.file_at_head("main", "stale.txt").is_none());

    // History retains the clearing commit.
    let messages: Vec<String> = dest
        .history("main")
        .into_iter()
        .map(|(_, c)| c.message)
        .collect();
    assert!(messages.iter().any(|m| m.contains("Clear branch")));
}

#[tokio::test(start_paused = true)]
async fn bulk_transfer_skips_ignored_paths() {
    let source = MockRemote::new("acme", "firmware");
    source.seed_branch(
        "main",
        &[
            ("src/lib.rs", "pub fn f() {}\n"),
            ("node_modules/dep/index.js", "junk"),
            (".env", "SECRET=1"),
        ],
    );

    let dest = MockRemote::new("acme", "mirror");
    dest.seed_branch("main", &[]);

    let report = transfer::transfer_repository(
        &source,
        &dest,
        "Mirror",
        &MirrorOptions::default(),
        &fast_retry(),
        None,
    )
    .await
    .expect("transfer succeeds");

    assert_eq!(report.ignored, 2);
    assert_eq!(report.files_committed, 1);
    assert!(dest.file_at_head("main", "src/lib.rs").is_some());
    assert!(dest.file_at_head("main", ".env").is_none());
}

#[tokio::test(start_paused = true)]
async fn dry_run_plans_without_writing() {
    let source = MockRemote::new("acme", "firmware");
    source.seed_branch("main", &[("a.txt", "alpha"), ("b.txt", "beta")]);

    let dest = MockRemote::new("acme", "mirror");
    dest.seed_branch("main", &[]);
    let head_before = dest.head_of("main");

    let options = MirrorOptions {
        dry_run: true,
        ..MirrorOptions::default()
    };
    let report =
        transfer::transfer_repository(&source, &dest, "Mirror", &options, &fast_retry(), None)
            .await
            .expect("dry run succeeds");

    assert_eq!(report.files_committed, 2);
    assert_eq!(dest.head_of("main"), head_before);
    assert!(dest.file_at_head("main", "a.txt").is_none());
}

#[tokio::test(start_paused = true)]
async fn selective_transfer_moves_only_selected_paths() {
    let source = MockRemote::new("acme", "firmware");
    source.seed_branch(
        "main",
        &[("a.txt", "alpha v2"), ("b.txt", "beta"), ("c.txt", "gamma")],
    );

    let dest = MockRemote::new("acme", "mirror");
    dest.seed_branch("main", &[("a.txt", "alpha v1")]);

    let comparisons = transfer::compare_repositories(&source, &dest, None)
        .await
        .expect("comparison succeeds");

    // Apply new + modified, the default selection.
    let options = TransferOptions::default();
    let selected: std::collections::HashSet<String> = comparisons
        .iter()
        .filter(|c| match c.status {
            ComparisonStatus::New => options.include_new,
            ComparisonStatus::Modified => options.include_modified,
            _ => false,
        })
        .map(|c| c.path.clone())
        .collect();
    assert_eq!(selected.len(), 3);

    let report = transfer::transfer_selected(
        &source,
        &dest,
        &selected,
        "Sync changed files",
        &fast_retry(),
        None,
    )
    .await
    .expect("transfer succeeds");

    assert_eq!(report.files_committed, 3);
    assert_eq!(dest.file_at_head("main", "a.txt").unwrap(), b"alpha v2");
    assert_eq!(dest.file_at_head("main", "b.txt").unwrap(), b"beta");
}

#[tokio::test(start_paused = true)]
async fn selective_transfer_with_empty_selection_is_a_no_op() {
    let source = MockRemote::new("acme", "firmware");
    source.seed_branch("main", &[("a.txt", "alpha")]);
    let dest = MockRemote::new("acme", "mirror");
    dest.seed_branch("main", &[]);
    let head_before = dest.head_of("main");

    let report = transfer::transfer_selected(
        &source,
        &dest,
        &std::collections::HashSet::new(),
        "Nothing",
        &fast_retry(),
        None,
    )
    .await
    .expect("no-op succeeds");

    assert_eq!(report.files_committed, 0);
    assert_eq!(dest.head_of("main"), head_before);
}

#[tokio::test]
async fn missing_source_branch_is_a_descriptive_error() {
    let source = MockRemote::new("acme", "firmware"); // nothing seeded
    let dest = MockRemote::new("acme", "mirror");
    dest.seed_branch("main", &[]);

    let err = transfer::transfer_repository(
        &source,
        &dest,
        "Mirror",
        &MirrorOptions::default(),
        &fast_retry(),
        None,
    )
    .await
    .expect_err("missing source branch fails");

    assert!(matches!(err, RemoteError::NotFound { .. }));
    assert!(err.to_string().contains("main"));
}

// ─── Commit history ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn commit_history_lists_newest_first() {
    let remote = MockRemote::new("acme", "firmware");
    remote.seed_branch("main", &[]);

    for i in 0..5 {
        transfer::commit_file(
            &remote,
            &format!("f{i}.txt"),
            "x\n",
            &format!("Commit {i}"),
            &fast_retry(),
            None,
        )
        .await
        .expect("commit succeeds");
    }

    let commits = remote.list_commits("main", 3).await.unwrap();
    assert_eq!(commits.len(), 3);
    assert_eq!(commits[0].message, "Commit 4");
    assert_eq!(commits[1].message, "Commit 3");
}
