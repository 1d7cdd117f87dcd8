//! Compaction: merges every live SSTable into a single newer one.
//!
//! Runs synchronously on the flushing thread while the engine lock is held,
//! so a caller that trips the threshold pays for the whole merge. Because
//! the merge always covers the entire live set, a tombstone can have no
//! shadowed entry in any table outside the merge, and tombstones are dropped
//! from the output. (The memtable is not part of compaction, but it is
//! strictly newer than every SSTable, so its entries — tombstones included —
//! shadow whatever compaction produces.) A partial compaction must never
//! drop tombstones; this engine never performs one.

use std::fs;

use sstable::{EntryResult, MergeIterator, SSTableReader, SSTableWriter, SstableError};

use crate::error::Result;
use crate::manifest;
use crate::Engine;

impl Engine {
    /// Merges all live SSTables into one. Caller holds the engine lock.
    ///
    /// Steps:
    /// 1. Build one ascending iterator per live table, newest first, and
    ///    k-way merge them; on equal keys the newest table's entry survives.
    /// 2. Stream the merge into a freshly allocated generation (greater
    ///    than every input), dropping tombstones, via temp + fsync + rename.
    /// 3. Replace the live list with the single output — or with nothing if
    ///    every surviving record was a tombstone, in which case the output
    ///    file is removed again.
    /// 4. Close and unlink the input files.
    ///
    /// Crash-tolerance: if the output is renamed but inputs not yet
    /// unlinked, recovery sees both and the higher generation supersedes;
    /// if the output never reached its final name, the temp file is ignored
    /// and the old set stays live.
    pub(crate) fn compact(&mut self) -> Result<()> {
        if self.sstables.len() <= 1 {
            return Ok(());
        }

        let input_count = self.sstables.len();
        let gen = self.manifest.allocate();
        let path = manifest::sstable_path(&self.data_dir, gen);

        // Stream merge -> writer without materializing the dataset. Errors
        // inside the merge cannot cross the iterator boundary, so they are
        // parked in `merge_error` and checked after the write.
        let mut merge_error: Option<SstableError> = None;
        let count = {
            let sources: Vec<Box<dyn Iterator<Item = EntryResult> + '_>> = self
                .sstables
                .iter()
                .map(|sst| Box::new(sst.iter()) as Box<dyn Iterator<Item = EntryResult> + '_>)
                .collect();
            let mut merge = MergeIterator::new(sources)?;

            let stream = std::iter::from_fn(|| loop {
                match merge.next_entry() {
                    Ok(Some((key, entry))) => {
                        if entry.is_tombstone() {
                            continue; // full compaction: nothing left to shadow
                        }
                        return Some((key, entry));
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        merge_error = Some(e);
                        return None;
                    }
                }
            });

            SSTableWriter::write(&path, stream)?
        };

        if let Some(e) = merge_error {
            // The writer finished a truncated output; discard it. The old
            // tables are still live and untouched.
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        if count == 0 {
            // Everything was tombstoned away; an empty table earns no slot.
            let _ = fs::remove_file(&path);
            let old_gens = self.manifest.retire_all();
            self.sstables.clear();
            return self.unlink_retired(old_gens, input_count, gen, count);
        }

        // Open the output before touching engine state so a failure here
        // leaves the old set fully live.
        let reader = SSTableReader::open(&path)?;
        let old_gens = self.manifest.retire_all();
        self.manifest.install_newest(gen);
        // Replacing the vec drops the old readers, closing their handles
        // before the files are unlinked.
        self.sstables = vec![reader];
        self.unlink_retired(old_gens, input_count, gen, count)
    }

    /// Removes retired input files and logs the outcome.
    fn unlink_retired(
        &self,
        old_gens: Vec<u64>,
        inputs: usize,
        gen: u64,
        entries: u64,
    ) -> Result<()> {
        for old in old_gens {
            let _ = fs::remove_file(manifest::sstable_path(&self.data_dir, old));
        }

        tracing::info!(inputs, gen, entries, "compacted sstables");
        Ok(())
    }
}
