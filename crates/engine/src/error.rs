use thiserror::Error;

/// Unified error type for engine operations.
///
/// Not-found is deliberately absent: a `get` on a missing or tombstoned key
/// is a successful `Ok(None)`, never an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad caller input (mismatched batch lengths, empty key, non-positive
    /// threshold). Reported before anything touches disk.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A WAL append or sync failed. The pending operation did not take
    /// effect; the engine remains usable if the underlying I/O recovers.
    #[error("durability error: {0}")]
    Durability(#[from] wal::WalError),

    /// An SSTable could not be written, opened, or read. Corruption detected
    /// at open time aborts startup instead of silently proceeding.
    #[error("sstable error: {0}")]
    Sstable(#[from] sstable::SstableError),

    /// A filesystem operation outside the WAL and SSTable codecs failed
    /// (directory scan, unlink).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
