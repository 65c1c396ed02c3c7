//! Size-aware strategy selection and batch partitioning.
//!
//! Strategy choice happens before any network call: the payload size and
//! file count are locally knowable, so escalating through thrown errors
//! is reserved for remote-side limits only.

use crate::remote::FileBlob;

use super::types::{
    BATCH_MAX_BYTES, BATCH_MAX_FILES, LARGE_PAYLOAD_BYTES, SMALL_BATCH_FILE_THRESHOLD, UploadFile,
};

/// How a multi-file upload is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// One commit per file, fixed delay between files. Slowest, most
    /// resilient; chosen for heavy payloads.
    SequentialSafe,
    /// Fixed-size batches with bounded parallelism inside a batch and a
    /// delay between batches.
    SmallBatch,
    /// Everything in flight at once, bounded by the upload concurrency.
    SinglePass,
}

/// Choose an execution strategy from the payload alone.
pub fn select_strategy(files: &[UploadFile]) -> TransferStrategy {
    let total_bytes: usize = files.iter().map(|f| f.content.len()).sum();

    if total_bytes > LARGE_PAYLOAD_BYTES {
        TransferStrategy::SequentialSafe
    } else if files.len() > SMALL_BATCH_FILE_THRESHOLD {
        TransferStrategy::SmallBatch
    } else {
        TransferStrategy::SinglePass
    }
}

/// An ordered group of staged files bounded by count and cumulative size.
#[derive(Debug, Default)]
pub struct TransferBatch {
    pub files: Vec<FileBlob>,
    pub total_bytes: usize,
}

impl TransferBatch {
    fn push(&mut self, blob: FileBlob) {
        self.total_bytes += blob.size;
        self.files.push(blob);
    }

    /// True when the batch holds a single file larger than the byte cap.
    pub fn is_oversized_singleton(&self) -> bool {
        self.files.len() == 1 && self.total_bytes > BATCH_MAX_BYTES
    }
}

/// Partition staged blobs into ordered batches.
///
/// No batch exceeds [`BATCH_MAX_FILES`] or [`BATCH_MAX_BYTES`] unless it
/// is a single file that alone exceeds the byte cap; such a file becomes
/// its own batch rather than being dropped.
pub fn partition_batches(blobs: Vec<FileBlob>) -> Vec<TransferBatch> {
    let mut batches = Vec::new();
    let mut current = TransferBatch::default();

    for blob in blobs {
        let would_overflow = !current.files.is_empty()
            && (current.files.len() >= BATCH_MAX_FILES
                || current.total_bytes + blob.size > BATCH_MAX_BYTES);

        if would_overflow {
            batches.push(std::mem::take(&mut current));
        }

        current.push(blob);
    }

    if !current.files.is_empty() {
        batches.push(current);
    }

    batches
}
