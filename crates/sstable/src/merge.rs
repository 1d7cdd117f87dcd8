//! K-way merge over sorted entry streams.
//!
//! Produces `(key, ValueEntry)` pairs in ascending key order from any number
//! of sources — SSTable range iterators, a memtable snapshot — each already
//! sorted and duplicate-free internally. **Sources must be passed
//! newest-first**: when the same key appears in several sources, only the
//! entry from the lowest-indexed source is emitted and the rest are
//! discarded. Recency is a property of the source (memtable over SSTables,
//! higher generation over lower), not of the entries themselves, so the
//! tie-break is by source index rather than by sequence number.
//!
//! This is the one primitive behind both range queries (memtable + all
//! SSTables) and compaction (all SSTables).

use memtable::ValueEntry;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::SstableError;

/// Item type of a merge source: a sorted, fallible entry stream.
pub type EntryResult = Result<(Vec<u8>, ValueEntry), SstableError>;

/// One pending entry from one source, ordered for the min-heap.
struct HeapEntry {
    key: Vec<u8>,
    entry: ValueEntry,
    /// Index into `sources`; lower = newer.
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse the key comparison so the
        // smallest key pops first. On equal keys, the lower source index
        // (newer source) pops first and wins.
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// Streaming k-way merge with newest-wins duplicate resolution.
pub struct MergeIterator<'a> {
    sources: Vec<Box<dyn Iterator<Item = EntryResult> + 'a>>,
    heap: BinaryHeap<HeapEntry>,
}

impl<'a> MergeIterator<'a> {
    /// Builds a merge over `sources`, ordered newest-first, priming the heap
    /// with the first entry of each.
    pub fn new(
        sources: Vec<Box<dyn Iterator<Item = EntryResult> + 'a>>,
    ) -> Result<Self, SstableError> {
        let mut merge = Self {
            sources,
            heap: BinaryHeap::new(),
        };
        for i in 0..merge.sources.len() {
            merge.advance(i)?;
        }
        Ok(merge)
    }

    /// Pulls the next entry from source `i` onto the heap, if any.
    fn advance(&mut self, i: usize) -> Result<(), SstableError> {
        if let Some(item) = self.sources[i].next() {
            let (key, entry) = item?;
            self.heap.push(HeapEntry {
                key,
                entry,
                source: i,
            });
        }
        Ok(())
    }

    /// Returns the next `(key, entry)` in ascending key order, or `None`
    /// when every source is exhausted.
    ///
    /// For a key present in several sources, the newest source's entry is
    /// returned and the older duplicates are drained and dropped.
    pub fn next_entry(&mut self) -> Result<Option<(Vec<u8>, ValueEntry)>, SstableError> {
        let top = match self.heap.pop() {
            Some(e) => e,
            None => return Ok(None),
        };
        self.advance(top.source)?;

        // Drain older entries for the same key.
        while let Some(peek) = self.heap.peek() {
            if peek.key != top.key {
                break;
            }
            let dup = self.heap.pop().expect("peeked entry must pop");
            self.advance(dup.source)?;
        }

        Ok(Some((top.key, top.entry)))
    }
}
