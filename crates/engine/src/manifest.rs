//! # Manifest — live SSTable generations
//!
//! The ordered list of live SSTables, newest first, plus the
//! next-generation counter. Nothing is persisted beyond the data files
//! themselves: an SSTable's generation is encoded in its filename
//! (`sstable_<g>.dat`), installation is temp-file + rename, and superseded
//! files are unlinked only after their replacement is durably renamed — so a
//! directory scan at startup always reconstructs a correct manifest. Any
//! refactor that reorders those steps must introduce an explicit manifest
//! file instead.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Filename prefix for SSTable files.
const SSTABLE_PREFIX: &str = "sstable_";
/// Filename extension for SSTable files (without the dot).
const SSTABLE_EXT: &str = "dat";

/// In-memory manifest: live generations newest-first and the counter for
/// the next generation to allocate.
#[derive(Debug)]
pub struct Manifest {
    /// Live SSTable generations, newest (highest) first.
    live: Vec<u64>,
    next_gen: u64,
}

impl Manifest {
    /// Rebuilds the manifest by scanning `data_dir` for `sstable_<g>.dat`.
    ///
    /// Generations sort numerically, newest first. The next-generation
    /// counter becomes `max(g) + 1`, or 0 when no SSTables exist. Files that
    /// do not match the naming scheme (including `.dat.tmp` leftovers) are
    /// ignored.
    pub fn scan(data_dir: &Path) -> Result<Self> {
        let mut live = Vec::new();
        for entry in fs::read_dir(data_dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(gen) = parse_generation(name) {
                    live.push(gen);
                }
            }
        }
        live.sort_unstable_by(|a, b| b.cmp(a));

        let next_gen = live.first().map(|g| g + 1).unwrap_or(0);
        Ok(Self { live, next_gen })
    }

    /// Allocates the next generation number.
    pub fn allocate(&mut self) -> u64 {
        let gen = self.next_gen;
        self.next_gen += 1;
        gen
    }

    /// Installs `gen` at the newest end of the live list.
    pub fn install_newest(&mut self, gen: u64) {
        self.live.insert(0, gen);
    }

    /// Removes every generation from the live list, returning them
    /// (newest first) so the caller can unlink the files.
    pub fn retire_all(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.live)
    }

    /// Live generations, newest first.
    pub fn live(&self) -> &[u64] {
        &self.live
    }

    /// Number of live SSTables.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// The generation the next allocation will return.
    pub fn next_generation(&self) -> u64 {
        self.next_gen
    }
}

/// Path of the SSTable file for `gen` under `data_dir`.
pub fn sstable_path(data_dir: &Path, gen: u64) -> PathBuf {
    data_dir.join(format!("{SSTABLE_PREFIX}{gen}.{SSTABLE_EXT}"))
}

/// Parses `sstable_<g>.dat` into `g`; `None` for any other name.
pub fn parse_generation(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(SSTABLE_PREFIX)?
        .strip_suffix(&format!(".{SSTABLE_EXT}"))?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_generation_accepts_only_the_naming_scheme() {
        assert_eq!(parse_generation("sstable_0.dat"), Some(0));
        assert_eq!(parse_generation("sstable_42.dat"), Some(42));
        assert_eq!(parse_generation("sstable_42.dat.tmp"), None);
        assert_eq!(parse_generation("sstable_.dat"), None);
        assert_eq!(parse_generation("sstable_x.dat"), None);
        assert_eq!(parse_generation("wal.log"), None);
        assert_eq!(parse_generation("MANIFEST"), None);
    }

    #[test]
    fn scan_orders_numerically_newest_first() {
        let dir = tempdir().unwrap();
        // 9 vs 10 would invert under lexicographic ordering.
        for gen in [9u64, 10, 2] {
            std::fs::write(sstable_path(dir.path(), gen), b"x").unwrap();
        }
        std::fs::write(dir.path().join("wal.log"), b"").unwrap();
        std::fs::write(dir.path().join("sstable_5.dat.tmp"), b"junk").unwrap();

        let manifest = Manifest::scan(dir.path()).unwrap();
        assert_eq!(manifest.live(), &[10, 9, 2]);
        assert_eq!(manifest.next_generation(), 11);
    }

    #[test]
    fn empty_directory_starts_at_generation_zero() {
        let dir = tempdir().unwrap();
        let mut manifest = Manifest::scan(dir.path()).unwrap();
        assert!(manifest.is_empty());
        assert_eq!(manifest.allocate(), 0);
        assert_eq!(manifest.allocate(), 1);
    }

    #[test]
    fn install_and_retire_maintain_newest_first_order() {
        let dir = tempdir().unwrap();
        let mut manifest = Manifest::scan(dir.path()).unwrap();

        let g0 = manifest.allocate();
        manifest.install_newest(g0);
        let g1 = manifest.allocate();
        manifest.install_newest(g1);
        assert_eq!(manifest.live(), &[1, 0]);

        let retired = manifest.retire_all();
        assert_eq!(retired, vec![1, 0]);
        assert!(manifest.is_empty());

        // The counter keeps climbing across retirement.
        assert_eq!(manifest.allocate(), 2);
    }
}
