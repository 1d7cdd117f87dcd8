//! # SSTable — Sorted String Table
//!
//! Immutable, on-disk storage files for the silt storage engine.
//!
//! When the in-memory [`memtable::Memtable`] reaches its entry-count
//! threshold the engine flushes it to disk as an SSTable. SSTables are
//! *write-once, read-many* — once renamed into place they are never
//! modified, only replaced wholesale during compaction.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ DATA SECTION (sorted key/value records)       │
//! │                                               │
//! │ key_len (u32) | key | seq (u64) | present (u8)│
//! │ [val_len (u32) | val]   (present == 1 only)   │
//! │                                               │
//! │ ... repeated for each entry ...               │
//! ├───────────────────────────────────────────────┤
//! │ INDEX SECTION (dense: one entry per record)   │
//! │                                               │
//! │ key_len (u32) | key | data_offset (u64)       │
//! │                                               │
//! │ ... repeated for each entry ...               │
//! ├───────────────────────────────────────────────┤
//! │ FOOTER (always last 20 bytes)                 │
//! │                                               │
//! │ index_offset (u64) | entry_count (u64)        │
//! │ magic (u32) "SLT1"                            │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. `present == 0` is the tombstone marker,
//! distinguishable from any legal value encoding (including the empty
//! value). The index is dense — one `(key, offset)` pair per record — which
//! is acceptable because these tables stay small; a reader loads the whole
//! index into memory and binary-searches it.

mod format;
mod merge;
mod reader;
mod writer;

use std::io;
use thiserror::Error;

pub use format::{FOOTER_BYTES, SSTABLE_MAGIC};
pub use merge::{EntryResult, MergeIterator};
pub use reader::{RangeIter, SSTableReader};
pub use writer::SSTableWriter;

/// Errors from SSTable operations.
#[derive(Debug, Error)]
pub enum SstableError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The file does not decode as a valid SSTable: bad footer or magic, an
    /// index or data offset out of bounds, index keys out of order, or a
    /// record that disagrees with its index entry. Reported at open time
    /// where possible so a damaged table is never installed.
    #[error("corrupt sstable: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests;
