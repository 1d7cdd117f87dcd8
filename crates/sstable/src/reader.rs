use byteorder::{LittleEndian, ReadBytesExt};
use memtable::ValueEntry;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::format::{footer_pos, read_footer, FOOTER_BYTES, SSTABLE_MAGIC};
use crate::SstableError;

/// Maximum key size we'll allocate during reads (64 KiB). Prevents OOM on
/// corrupt files.
const MAX_KEY_BYTES: usize = 64 * 1024;
/// Maximum value size we'll allocate during reads (16 MiB).
const MAX_VALUE_BYTES: usize = 16 * 1024 * 1024;
/// Smallest possible index entry: key_len (4) + empty key + offset (8).
const MIN_INDEX_ENTRY_BYTES: u64 = 12;

/// Reads an immutable SSTable for point and range lookups.
///
/// [`open`](SSTableReader::open) validates the footer and loads the entire
/// dense index into memory as a sorted `Vec<(key, offset)>`. Point lookups
/// binary-search the index and then read exactly one record through a
/// persistent file handle; range scans walk a contiguous slice of index
/// positions. The handle is wrapped in a `Mutex` so reads work through a
/// shared `&self`.
pub struct SSTableReader {
    /// Path to the `.dat` file, kept for diagnostics.
    path: PathBuf,
    /// Dense index, ascending by key: one `(key, data_offset)` per record.
    index: Vec<(Vec<u8>, u64)>,
    /// Persistent file handle for record reads.
    file: Mutex<BufReader<File>>,
}

impl SSTableReader {
    /// Opens an SSTable and loads its index.
    ///
    /// Validation performed here (all failures are [`SstableError::Corrupt`]
    /// and must abort installation of the table):
    /// - the file holds at least a footer and the magic matches;
    /// - the index offset lies inside the file, before the footer;
    /// - the declared entry count fits between index offset and footer;
    /// - every data offset points inside the data region;
    /// - index keys are strictly ascending (binary search relies on it).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SstableError> {
        let path_buf = path.as_ref().to_path_buf();
        let mut f = File::open(&path_buf)?;
        let filesize = f.metadata()?.len();

        if filesize < FOOTER_BYTES {
            return Err(SstableError::Corrupt(format!(
                "{}: file too small to hold a footer",
                path_buf.display()
            )));
        }

        let (index_offset, entry_count, magic) = read_footer(&mut f)?;
        if magic != SSTABLE_MAGIC {
            return Err(SstableError::Corrupt(format!(
                "{}: bad magic {magic:#010x}",
                path_buf.display()
            )));
        }

        let footer_start = footer_pos(filesize);
        if index_offset > footer_start {
            return Err(SstableError::Corrupt(format!(
                "{}: index offset {index_offset} past end of file",
                path_buf.display()
            )));
        }
        let index_bytes = footer_start - index_offset;
        if entry_count.saturating_mul(MIN_INDEX_ENTRY_BYTES) > index_bytes {
            return Err(SstableError::Corrupt(format!(
                "{}: entry count {entry_count} does not fit in index section",
                path_buf.display()
            )));
        }

        f.seek(SeekFrom::Start(index_offset))?;
        let mut index: Vec<(Vec<u8>, u64)> = Vec::with_capacity(entry_count as usize);

        for _ in 0..entry_count {
            let key_len = f.read_u32::<LittleEndian>()? as usize;
            if key_len > MAX_KEY_BYTES {
                return Err(SstableError::Corrupt(format!(
                    "{}: index key length {key_len} exceeds cap",
                    path_buf.display()
                )));
            }
            let mut key = vec![0u8; key_len];
            f.read_exact(&mut key)?;
            let data_offset = f.read_u64::<LittleEndian>()?;
            if data_offset >= index_offset {
                return Err(SstableError::Corrupt(format!(
                    "{}: data offset {data_offset} points past data region",
                    path_buf.display()
                )));
            }
            if let Some((last, _)) = index.last() {
                if last.as_slice() >= key.as_slice() {
                    return Err(SstableError::Corrupt(format!(
                        "{}: index keys out of order",
                        path_buf.display()
                    )));
                }
            }
            index.push((key, data_offset));
        }

        if f.stream_position()? > footer_start {
            return Err(SstableError::Corrupt(format!(
                "{}: index overruns footer",
                path_buf.display()
            )));
        }

        f.seek(SeekFrom::Start(0))?;

        Ok(Self {
            path: path_buf,
            index,
            file: Mutex::new(BufReader::new(f)),
        })
    }

    /// Point lookup for a single key.
    ///
    /// Returns `Ok(Some(entry))` if the key exists in this table — the entry
    /// may be a tombstone — and `Ok(None)` if the index has no exact match.
    /// One seek + one record read through the persistent handle.
    pub fn get(&self, key: &[u8]) -> Result<Option<ValueEntry>, SstableError> {
        let slot = match self
            .index
            .binary_search_by(|(k, _)| k.as_slice().cmp(key))
        {
            Ok(i) => i,
            Err(_) => return Ok(None),
        };

        let (stored_key, entry) = self.read_entry_at(self.index[slot].1)?;
        if stored_key != key {
            return Err(SstableError::Corrupt(format!(
                "{}: index pointed to mismatching key",
                self.path.display()
            )));
        }
        Ok(Some(entry))
    }

    /// Iterates records with `start <= key <= end` in ascending key order.
    ///
    /// Binary search locates the first key >= `start`; the scan is then
    /// bounded by the first index position whose key exceeds `end`.
    /// Tombstones are yielded — the engine decides what they shadow.
    pub fn range(&self, start: &[u8], end: &[u8]) -> RangeIter<'_> {
        let lo = self.index.partition_point(|(k, _)| k.as_slice() < start);
        let hi = self.index.partition_point(|(k, _)| k.as_slice() <= end);
        RangeIter {
            reader: self,
            pos: lo,
            end: hi.max(lo),
        }
    }

    /// Iterates every record in the table in ascending key order.
    pub fn iter(&self) -> RangeIter<'_> {
        RangeIter {
            reader: self,
            pos: 0,
            end: self.index.len(),
        }
    }

    /// Number of records in the table.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Reads the record at `offset`: `(key, entry)`.
    fn read_entry_at(&self, offset: u64) -> Result<(Vec<u8>, ValueEntry), SstableError> {
        let mut f = self.file.lock();
        f.seek(SeekFrom::Start(offset))?;

        let key_len = f.read_u32::<LittleEndian>()? as usize;
        if key_len > MAX_KEY_BYTES {
            return Err(SstableError::Corrupt(format!(
                "{}: record key length {key_len} exceeds cap",
                self.path.display()
            )));
        }
        let mut key = vec![0u8; key_len];
        f.read_exact(&mut key)?;

        let seq = f.read_u64::<LittleEndian>()?;
        let present = f.read_u8()?;
        let value = match present {
            1 => {
                let val_len = f.read_u32::<LittleEndian>()? as usize;
                if val_len > MAX_VALUE_BYTES {
                    return Err(SstableError::Corrupt(format!(
                        "{}: record value length {val_len} exceeds cap",
                        self.path.display()
                    )));
                }
                let mut val = vec![0u8; val_len];
                f.read_exact(&mut val)?;
                Some(val)
            }
            0 => None,
            other => {
                return Err(SstableError::Corrupt(format!(
                    "{}: invalid payload tag {other}",
                    self.path.display()
                )));
            }
        };

        Ok((key, ValueEntry { seq, value }))
    }
}

/// Bounded ascending scan over a contiguous run of index positions.
pub struct RangeIter<'a> {
    reader: &'a SSTableReader,
    pos: usize,
    end: usize,
}

impl<'a> Iterator for RangeIter<'a> {
    type Item = Result<(Vec<u8>, ValueEntry), SstableError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let offset = self.reader.index[self.pos].1;
        self.pos += 1;
        Some(self.reader.read_entry_at(offset))
    }
}
