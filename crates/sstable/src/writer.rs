use byteorder::{LittleEndian, WriteBytesExt};
use memtable::ValueEntry;
use std::fs::{rename, OpenOptions};
use std::io::{Seek, Write};
use std::path::Path;

use crate::format::write_footer;
use crate::SstableError;

/// Serializes a sorted record stream into an immutable SSTable file.
pub struct SSTableWriter {}

impl SSTableWriter {
    /// Writes an SSTable at `path` from `entries`, which must already be
    /// sorted ascending by key with no duplicates (a memtable snapshot or a
    /// merge stream — both satisfy this by construction).
    ///
    /// The file is written to `<path>.tmp` alongside the target, fsynced,
    /// and atomically renamed into place, so a partially written table is
    /// never visible under a valid name. Tombstones are written out like any
    /// other record (`present = 0`) so deletions propagate through
    /// compactions.
    ///
    /// Returns the number of records written.
    pub fn write<I>(path: &Path, entries: I) -> Result<u64, SstableError>
    where
        I: IntoIterator<Item = (Vec<u8>, ValueEntry)>,
    {
        let tmp_path = path.with_extension("dat.tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        // In-memory index buffer: (key, offset) per record.
        let mut index: Vec<(Vec<u8>, u64)> = Vec::new();

        for (key, entry) in entries {
            let offset = file.stream_position()?;

            file.write_u32::<LittleEndian>(key.len() as u32)?;
            file.write_all(&key)?;
            file.write_u64::<LittleEndian>(entry.seq)?;

            match &entry.value {
                Some(v) => {
                    file.write_u8(1)?;
                    file.write_u32::<LittleEndian>(v.len() as u32)?;
                    file.write_all(v)?;
                }
                None => {
                    file.write_u8(0)?;
                }
            }

            index.push((key, offset));
        }

        let index_offset = file.stream_position()?;
        for (key, data_offset) in &index {
            file.write_u32::<LittleEndian>(key.len() as u32)?;
            file.write_all(key)?;
            file.write_u64::<LittleEndian>(*data_offset)?;
        }

        write_footer(&mut file, index_offset, index.len() as u64)?;

        file.flush()?;
        file.sync_all()?;

        // Atomically move into place.
        rename(&tmp_path, path)?;

        Ok(index.len() as u64)
    }
}
