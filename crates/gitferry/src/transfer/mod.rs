//! Transfer orchestration: strategy selection, chunked commits, batched
//! tree writes, and repository comparison.
//!
//! Every long-running operation in this module streams status through an
//! injected [`ProgressCallback`]; none of it depends on a UI.

pub mod chunk;
pub mod compare;
pub mod engine;
pub mod progress;
pub mod strategy;
pub mod types;
pub mod upload;

pub use compare::{classify_paths, compare_repositories};
pub use engine::{MirrorOptions, TransferReport, transfer_repository, transfer_selected};
pub use progress::{ProgressCallback, ProgressEvent, ProgressTracker, emit};
pub use strategy::{TransferBatch, TransferStrategy, partition_batches, select_strategy};
pub use types::{
    ComparisonStatus, FileComparison, FileResult, TransferOptions, TransferOutcome, UploadFile,
};
pub use upload::{commit_file, upload_files};
