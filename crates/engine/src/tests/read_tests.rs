use super::helpers::open_engine;
use anyhow::Result;
use tempfile::tempdir;

#[test]
fn get_prefers_memtable_over_sstables() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 2, 10);

    engine.put(b"k".to_vec(), b"old".to_vec())?;
    engine.put(b"pad".to_vec(), b"p".to_vec())?; // flush: both hit disk
    engine.put(b"k".to_vec(), b"new".to_vec())?; // memtable only

    assert_eq!(engine.get(b"k")?, Some(b"new".to_vec()));
    Ok(())
}

#[test]
fn get_prefers_newer_sstable_over_older() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 1, 10);

    // Each put flushes immediately: two generations, same key.
    engine.put(b"k".to_vec(), b"gen0".to_vec())?;
    engine.put(b"k".to_vec(), b"gen1".to_vec())?;
    assert_eq!(engine.sstable_count(), 2);

    assert_eq!(engine.get(b"k")?, Some(b"gen1".to_vec()));
    Ok(())
}

#[test]
fn flushed_tombstone_shadows_older_sstable() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 1, 10);

    engine.put(b"k".to_vec(), b"v".to_vec())?; // sstable_0
    engine.delete(b"k".to_vec())?; // sstable_1 holds the tombstone
    assert_eq!(engine.sstable_count(), 2);
    assert_eq!(engine.memtable_len(), 0);

    assert_eq!(engine.get(b"k")?, None, "tombstone read from disk");
    Ok(())
}

#[test]
fn reads_do_not_touch_the_wal() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 1000, 10);
    engine.put(b"k".to_vec(), b"v".to_vec())?;

    let wal_before = super::helpers::wal_len(dir.path());
    for _ in 0..10 {
        engine.get(b"k")?;
        engine.get(b"missing")?;
        engine.get_range(b"a", b"z")?;
    }
    assert_eq!(super::helpers::wal_len(dir.path()), wal_before);
    Ok(())
}

#[test]
fn get_searches_all_generations() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 1, 10);

    // Distinct keys spread across several flushes.
    let pairs: &[(&[u8], &[u8])] = &[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")];
    for (k, v) in pairs {
        engine.put(k.to_vec(), v.to_vec())?;
    }
    assert_eq!(engine.sstable_count(), 3);

    assert_eq!(engine.get(b"a")?, Some(b"1".to_vec()));
    assert_eq!(engine.get(b"b")?, Some(b"2".to_vec()));
    assert_eq!(engine.get(b"c")?, Some(b"3".to_vec()));
    assert_eq!(engine.get(b"d")?, None);
    Ok(())
}
