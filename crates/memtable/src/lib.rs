//! # Memtable — in-memory sorted table
//!
//! Buffers recent writes in key order until the engine flushes them to an
//! SSTable. Deletions are recorded as tombstones (`value: None`) so they can
//! shadow older entries in SSTables; a tombstone hit must therefore be
//! distinguishable from an absent key, which is why [`Memtable::get`]
//! returns the raw [`ValueEntry`].
//!
//! Size is tracked as the entry count — the engine's flush threshold is a
//! number of entries, and overwrites keep the count unchanged.
//!
//! The container itself is not synchronized; the engine serializes all
//! access behind its own lock.

use std::collections::BTreeMap;
use std::ops::Bound;

/// A payload plus the sequence number assigned at commit.
///
/// `value == None` is a tombstone: the key was deleted, and the tombstone
/// shadows any older value for the same key in SSTables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueEntry {
    /// Sequence number assigned by the engine at commit.
    pub seq: u64,
    /// The payload, or `None` for a tombstone.
    pub value: Option<Vec<u8>>,
}

impl ValueEntry {
    /// `true` if this entry marks a deletion.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// Ordered mapping from key to payload-or-tombstone.
#[derive(Debug, Default)]
pub struct Memtable {
    map: BTreeMap<Vec<u8>, ValueEntry>,
}

impl Memtable {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Inserts or overwrites `key` with `value`.
    ///
    /// An entry with an older sequence number never overwrites a newer one;
    /// this keeps replay idempotent regardless of how records interleave.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>, seq: u64) {
        if let Some(old) = self.map.get(&key) {
            if old.seq >= seq {
                return;
            }
        }
        self.map.insert(
            key,
            ValueEntry {
                seq,
                value: Some(value),
            },
        );
    }

    /// Records a tombstone for `key`.
    ///
    /// Deleting an absent key still inserts the tombstone so it can shadow
    /// older SSTable entries.
    pub fn delete(&mut self, key: Vec<u8>, seq: u64) {
        if let Some(old) = self.map.get(&key) {
            if old.seq >= seq {
                return;
            }
        }
        self.map.insert(key, ValueEntry { seq, value: None });
    }

    /// Looks up `key`.
    ///
    /// Three outcomes matter to the engine:
    /// - `Some(entry)` with `entry.value == Some(_)` — present with a value;
    /// - `Some(entry)` with `entry.value == None` — present as a tombstone,
    ///   which must end the read without consulting SSTables;
    /// - `None` — absent; older layers may still hold the key.
    pub fn get(&self, key: &[u8]) -> Option<&ValueEntry> {
        self.map.get(key)
    }

    /// Iterates all entries (tombstones included) in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &ValueEntry)> {
        self.map.iter()
    }

    /// Iterates entries with `start <= key <= end` in ascending key order.
    ///
    /// Callers must ensure `start <= end`; `BTreeMap::range` panics on an
    /// inverted range.
    pub fn range<'a>(
        &'a self,
        start: &'a [u8],
        end: &'a [u8],
    ) -> impl Iterator<Item = (&'a Vec<u8>, &'a ValueEntry)> {
        self.map
            .range::<[u8], _>((Bound::Included(start), Bound::Included(end)))
    }

    /// Number of entries, tombstones included. This is the size compared
    /// against the engine's flush threshold.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Empties the table after a successful flush.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}
