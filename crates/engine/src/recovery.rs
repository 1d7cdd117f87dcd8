//! Cold-start helpers: WAL replay and temp-file cleanup.

use memtable::Memtable;
use std::path::Path;
use wal::{WalError, WalReader, WalRecord};

use crate::error::Result;

/// Replays the WAL at `path` into `mem`, returning the highest sequence
/// number seen.
///
/// Values overwrite, deletions write tombstones; nothing is appended back to
/// the WAL. A missing file is a fresh start and returns `Ok(0)`. A torn tail
/// was already discarded by the reader and is not an error.
pub fn replay_wal<P: AsRef<Path>>(path: P, mem: &mut Memtable) -> Result<u64> {
    let mut reader = match WalReader::open(path.as_ref()) {
        Ok(r) => r,
        Err(WalError::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut max_seq = 0u64;
    reader.replay(|record| {
        max_seq = max_seq.max(record.seq());
        match record {
            WalRecord::Put { seq, key, value } => mem.put(key, value, seq),
            WalRecord::Del { seq, key } => mem.delete(key, seq),
        }
    })?;

    Ok(max_seq)
}

/// Deletes leftover `*.dat.tmp` files from flushes or compactions that were
/// interrupted before their rename. Best effort: a file we cannot remove is
/// ignored here and will not be picked up by the manifest scan either.
pub(crate) fn cleanup_tmp_files(data_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(data_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".dat.tmp") {
                tracing::warn!(file = name, "removing leftover temp file");
                let _ = std::fs::remove_file(&path);
            }
        }
    }
}
