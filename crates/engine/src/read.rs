//! Read path: `get` and `get_range`.
//!
//! Point lookups check the memtable first (freshest data, tombstones
//! included), then SSTables newest to oldest; the first match wins and a
//! tombstone anywhere maps to absent. Range queries run a streaming k-way
//! merge over every source with newest-wins duplicate resolution. Neither
//! operation writes to the WAL or to disk.

use sstable::{EntryResult, MergeIterator};

use crate::error::Result;
use crate::Engine;

impl Engine {
    /// Looks up a key. `Ok(None)` means absent or deleted — never an error.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        // Memtable first. A tombstone here ends the read: it shadows every
        // older SSTable entry.
        if let Some(entry) = self.mem.get(key) {
            return Ok(entry.value.clone());
        }

        // SSTables newest to oldest; first match wins.
        for sst in &self.sstables {
            if let Some(entry) = sst.get(key)? {
                return Ok(entry.value);
            }
        }

        Ok(None)
    }

    /// Returns all live `(key, value)` pairs with `start <= key <= end`,
    /// ascending, each key at most once.
    ///
    /// One sorted stream per source — the memtable plus every SSTable,
    /// newest first — feeds a min-heap merge; on duplicate keys only the
    /// newest source's payload survives, and a surviving tombstone
    /// suppresses the key entirely. An inverted range yields nothing.
    pub fn get_range(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        if start > end {
            return Ok(Vec::new());
        }

        let mut sources: Vec<Box<dyn Iterator<Item = EntryResult> + '_>> =
            Vec::with_capacity(self.sstables.len() + 1);
        sources.push(Box::new(
            self.mem
                .range(start, end)
                .map(|(k, e)| Ok((k.clone(), e.clone()))),
        ));
        for sst in &self.sstables {
            sources.push(Box::new(sst.range(start, end)));
        }

        let mut merge = MergeIterator::new(sources)?;
        let mut out = Vec::new();
        while let Some((key, entry)) = merge.next_entry()? {
            if let Some(value) = entry.value {
                out.push((key, value));
            }
        }
        Ok(out)
    }
}
