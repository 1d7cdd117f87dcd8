use std::fs;
use std::path::Path;

use crate::{Config, Engine};

/// Opens an engine on `dir` with explicit thresholds.
pub fn open_engine(dir: &Path, memtable_size: usize, compaction_threshold: usize) -> Engine {
    Engine::open(
        Config::new(dir)
            .memtable_size(memtable_size)
            .compaction_threshold(compaction_threshold),
    )
    .expect("engine should open")
}

/// Counts `sstable_<g>.dat` files in `dir`.
pub fn count_sstable_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .and_then(crate::manifest::parse_generation)
                .is_some()
        })
        .count()
}

/// Size of the WAL file in `dir`, or 0 if it does not exist.
pub fn wal_len(dir: &Path) -> u64 {
    fs::metadata(dir.join(crate::WAL_FILE_NAME))
        .map(|m| m.len())
        .unwrap_or(0)
}
