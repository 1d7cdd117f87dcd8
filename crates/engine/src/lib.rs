//! # Engine — the silt storage engine
//!
//! The central orchestrator tying the [`wal`], [`memtable`], and [`sstable`]
//! crates into a complete LSM-style key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client (Db handle, one mutex around everything)
//!   |
//!   v
//! ┌─────────────────────────────────────────────────┐
//! │                    ENGINE                       │
//! │                                                 │
//! │ write.rs → WAL append + sync → Memtable insert  │
//! │               |                                 │
//! │               |  (entry count >= memtable_size) │
//! │               v                                 │
//! │            flush() → sstable_<g>.dat            │
//! │               |                                 │
//! │               |  (live tables > threshold)      │
//! │               v                                 │
//! │            compact() → single merged SSTable    │
//! │                                                 │
//! │ read.rs → Memtable → SSTables newest-to-oldest  │
//! │             (first match wins)                  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module         | Purpose                                              |
//! |----------------|------------------------------------------------------|
//! | `lib.rs`       | `Engine` struct, `Config`, recovery, `Debug`, `Drop` |
//! | `manifest.rs`  | Live generations, `sstable_<g>.dat` naming           |
//! | `recovery.rs`  | WAL replay, temp-file cleanup                        |
//! | `write.rs`     | `put`, `delete`, `batch_put`, `close`, flush         |
//! | `read.rs`      | `get`, `get_range`                                   |
//! | `compaction.rs`| Full merge of all live SSTables                      |
//! | `db.rs`        | [`Db`]: the shared, mutex-guarded handle             |
//!
//! ## Crash safety
//!
//! Every write is appended to the WAL and fsynced **before** it is
//! acknowledged; the WAL is truncated only **after** a flush has durably
//! renamed the new SSTable into place. SSTables install via temp file +
//! rename, and compaction unlinks its inputs only after the merged output
//! is durably installed. Recovery is therefore a directory scan plus a WAL
//! replay, and reproduces exactly the acknowledged state.

mod compaction;
mod db;
mod error;
mod manifest;
mod read;
mod recovery;
mod write;

pub use db::Db;
pub use error::{EngineError, Result};
pub use recovery::replay_wal;

use manifest::Manifest;
use memtable::Memtable;
use sstable::SSTableReader;
use std::path::{Path, PathBuf};
use wal::WalWriter;

/// Name of the write-ahead log file inside the data directory.
pub const WAL_FILE_NAME: &str = "wal.log";

/// Default memtable entry count that triggers a flush.
pub const DEFAULT_MEMTABLE_SIZE: usize = 1000;

/// Default number of live SSTables above which compaction runs.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 10;

/// Engine configuration.
///
/// ```rust,no_run
/// use engine::{Config, Engine};
///
/// let engine = Engine::open(
///     Config::new("data").memtable_size(500).compaction_threshold(4),
/// ).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `wal.log` and the `sstable_<g>.dat` files. Created
    /// if missing. Must be exclusive to one engine instance.
    pub data_dir: PathBuf,
    /// Memtable entry count at which a flush is triggered. Must be positive.
    pub memtable_size: usize,
    /// Live SSTable count above which compaction runs. Must be positive.
    pub compaction_threshold: usize,
}

impl Config {
    /// A configuration with the default thresholds.
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            memtable_size: DEFAULT_MEMTABLE_SIZE,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        }
    }

    /// Sets the memtable entry-count flush threshold.
    pub fn memtable_size(mut self, entries: usize) -> Self {
        self.memtable_size = entries;
        self
    }

    /// Sets the live-SSTable compaction threshold.
    pub fn compaction_threshold(mut self, tables: usize) -> Self {
        self.compaction_threshold = tables;
        self
    }
}

/// The storage engine: memtable + WAL + live SSTables.
///
/// All methods take `&mut self` or `&self` and assume external
/// serialization; [`Db`] provides the mutex. The internal `flush` and
/// `compact` routines are invoked from the write path with that lock
/// already held and never re-lock.
pub struct Engine {
    data_dir: PathBuf,
    mem: Memtable,
    /// Live SSTable readers, newest first, parallel to `manifest.live()`.
    sstables: Vec<SSTableReader>,
    manifest: Manifest,
    wal: WalWriter,
    /// Last sequence number assigned. Unique and monotonic per engine
    /// instance; restored from WAL replay on open.
    seq: u64,
    memtable_size: usize,
    compaction_threshold: usize,
}

impl Engine {
    /// Opens an engine on `config.data_dir`, performing full recovery.
    ///
    /// Steps:
    /// 1. Validate the configuration; create the data directory if missing.
    /// 2. Delete leftover `*.dat.tmp` files from interrupted installs.
    /// 3. Scan for `sstable_<g>.dat` files and open a reader for each,
    ///    newest first. A corrupt table aborts startup.
    /// 4. Replay the WAL into a fresh memtable (a missing WAL file is a
    ///    fresh start) and resume the sequence counter from the replayed
    ///    maximum. Replay never appends back to the WAL.
    ///
    /// Construction completes before any handle to the engine exists, so
    /// readers cannot race initialization.
    pub fn open(config: Config) -> Result<Self> {
        if config.memtable_size == 0 {
            return Err(EngineError::InvalidArgument(
                "memtable_size must be positive".into(),
            ));
        }
        if config.compaction_threshold == 0 {
            return Err(EngineError::InvalidArgument(
                "compaction_threshold must be positive".into(),
            ));
        }

        let data_dir = config.data_dir;
        std::fs::create_dir_all(&data_dir)?;

        recovery::cleanup_tmp_files(&data_dir);

        let manifest = Manifest::scan(&data_dir)?;
        let mut sstables = Vec::with_capacity(manifest.len());
        for &gen in manifest.live() {
            let reader = SSTableReader::open(manifest::sstable_path(&data_dir, gen))?;
            sstables.push(reader);
        }

        // Replay before opening the writer so the two never hold the file
        // at once.
        let wal_path = data_dir.join(WAL_FILE_NAME);
        let mut mem = Memtable::new();
        let seq = recovery::replay_wal(&wal_path, &mut mem)?;
        let wal = WalWriter::open(&wal_path)?;

        tracing::info!(
            data_dir = %data_dir.display(),
            sstables = sstables.len(),
            replayed = mem.len(),
            seq,
            "engine recovered"
        );

        Ok(Self {
            data_dir,
            mem,
            sstables,
            manifest,
            wal,
            seq,
            memtable_size: config.memtable_size,
            compaction_threshold: config.compaction_threshold,
        })
    }

    /// The data directory this engine owns.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The last sequence number assigned.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Number of entries currently buffered in the memtable.
    pub fn memtable_len(&self) -> usize {
        self.mem.len()
    }

    /// Number of live SSTables.
    pub fn sstable_count(&self) -> usize {
        self.sstables.len()
    }

    /// Live SSTable generations, newest first.
    pub fn sstable_generations(&self) -> &[u64] {
        self.manifest.live()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("data_dir", &self.data_dir)
            .field("seq", &self.seq)
            .field("memtable_entries", &self.mem.len())
            .field("memtable_size", &self.memtable_size)
            .field("sstables", &self.manifest.live())
            .field("compaction_threshold", &self.compaction_threshold)
            .finish()
    }
}

/// Best-effort flush on drop.
///
/// Data remaining in the memtable is flushed to an SSTable so an orderly
/// shutdown without an explicit [`close`](Engine::close) loses nothing.
/// Errors are ignored — Drop cannot propagate them — and the data is still
/// safe in the WAL for the next recovery.
impl Drop for Engine {
    fn drop(&mut self) {
        if !self.mem.is_empty() {
            let _ = self.flush();
        }
    }
}

#[cfg(test)]
mod tests;
