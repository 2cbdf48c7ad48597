//! Batch partitioning of records for model calls.
//!
//! Splits the ordered record list into contiguous, non-overlapping windows of
//! at most `batch_size` records, preserving original order. The last window
//! may be shorter.

use crate::dataset::Record;

/// Partition records into batches of at most `batch_size`.
///
/// Deterministic: the same input and size always yield the same partition.
/// `batch_size` must be positive; callers validate it at the config boundary.
pub fn partition(records: &[Record], batch_size: usize) -> impl Iterator<Item = &[Record]> {
    debug_assert!(batch_size > 0, "batch size must be positive");
    records.chunks(batch_size)
}
