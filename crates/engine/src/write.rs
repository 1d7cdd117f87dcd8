//! Write path: `put`, `delete`, `batch_put`, `close`, and the internal
//! `flush`.
//!
//! Every mutation is appended to the WAL and fsynced before the memtable
//! update, and acknowledged only after the sync. When the memtable reaches
//! the configured entry count it is drained into a new SSTable, the WAL is
//! truncated, and — if the live table count has grown past the compaction
//! threshold — compaction runs, all on the calling thread while the engine
//! lock is held.

use wal::WalRecord;

use crate::error::{EngineError, Result};
use crate::manifest;
use crate::Engine;
use sstable::{SSTableReader, SSTableWriter};

impl Engine {
    /// Inserts or updates a key-value pair.
    ///
    /// Returns after the record is durable in the WAL. An empty key is an
    /// argument error and touches nothing.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        ensure_key(&key)?;

        self.seq += 1;
        let seq = self.seq;

        self.wal.append(&WalRecord::Put {
            seq,
            key: key.clone(),
            value: value.clone(),
        })?;
        self.wal.sync()?;

        self.mem.put(key, value, seq);
        self.maybe_flush()
    }

    /// Deletes a key by writing a tombstone.
    ///
    /// Deleting an absent key is not an error: the tombstone is recorded
    /// anyway so it shadows any older SSTable entry for the key.
    pub fn delete(&mut self, key: Vec<u8>) -> Result<()> {
        ensure_key(&key)?;

        self.seq += 1;
        let seq = self.seq;

        self.wal.append(&WalRecord::Del {
            seq,
            key: key.clone(),
        })?;
        self.wal.sync()?;

        self.mem.delete(key, seq);
        self.maybe_flush()
    }

    /// Inserts multiple key-value pairs, durable as a unit.
    ///
    /// Each pair is appended to the WAL and applied to the memtable in
    /// order, then a single sync covers the whole batch; nothing is
    /// acknowledged until every record is durable. Mismatched lengths or an
    /// empty key fail before any write. A failure mid-batch leaves the
    /// already-appended records in place — recovery replays them, which is
    /// the defined outcome.
    pub fn batch_put(&mut self, keys: Vec<Vec<u8>>, values: Vec<Vec<u8>>) -> Result<()> {
        if keys.len() != values.len() {
            return Err(EngineError::InvalidArgument(format!(
                "batch_put length mismatch: {} keys vs {} values",
                keys.len(),
                values.len()
            )));
        }
        for key in &keys {
            ensure_key(key)?;
        }

        for (key, value) in keys.into_iter().zip(values) {
            self.seq += 1;
            let seq = self.seq;
            self.wal.append(&WalRecord::Put {
                seq,
                key: key.clone(),
                value: value.clone(),
            })?;
            self.mem.put(key, value, seq);
        }
        self.wal.sync()?;

        self.maybe_flush()
    }

    /// Flushes the memtable if non-empty, truncates the WAL, and closes all
    /// SSTable handles. The engine should be dropped afterwards.
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        // flush() already truncated the WAL if it ran; truncate explicitly
        // for the empty-memtable case so close always leaves an empty log.
        self.wal.truncate()?;
        self.sstables.clear();
        tracing::info!(data_dir = %self.data_dir.display(), "engine closed");
        Ok(())
    }

    fn maybe_flush(&mut self) -> Result<()> {
        if self.mem.len() >= self.memtable_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Drains the memtable into a new SSTable. Caller holds the engine lock.
    ///
    /// Steps:
    /// 1. No-op if the memtable is empty.
    /// 2. Allocate generation `g`; write `sstable_<g>.dat` (tombstones
    ///    included) via temp file + fsync + rename.
    /// 3. Install the new table at the newest end of the live list.
    /// 4. Clear the memtable, then truncate the WAL.
    /// 5. Compact if the live count now exceeds the threshold.
    ///
    /// A crash after the rename but before the truncate leaves the new
    /// SSTable plus an overlapping WAL; replay rebuilds the memtable, which
    /// shadows the duplicate SSTable entries, so observable state is
    /// unchanged and the WAL is truncated by the next successful flush.
    pub(crate) fn flush(&mut self) -> Result<()> {
        if self.mem.is_empty() {
            return Ok(());
        }

        let gen = self.manifest.allocate();
        let path = manifest::sstable_path(&self.data_dir, gen);

        let entries = self.mem.iter().map(|(k, e)| (k.clone(), e.clone()));
        let count = SSTableWriter::write(&path, entries)?;

        let reader = SSTableReader::open(&path)?;
        self.manifest.install_newest(gen);
        self.sstables.insert(0, reader);

        self.mem.clear();
        self.wal.truncate()?;

        tracing::info!(gen, entries = count, "flushed memtable to sstable");

        if self.manifest.len() > self.compaction_threshold {
            self.compact()?;
        }
        Ok(())
    }
}

fn ensure_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(EngineError::InvalidArgument("key must not be empty".into()));
    }
    Ok(())
}
