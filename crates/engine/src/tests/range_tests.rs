use super::helpers::open_engine;
use anyhow::Result;
use tempfile::tempdir;

fn pairs(raw: &[(&str, &str)]) -> Vec<(Vec<u8>, Vec<u8>)> {
    raw.iter()
        .map(|(k, v)| (k.as_bytes().to_vec(), v.as_bytes().to_vec()))
        .collect()
}

#[test]
fn range_spans_memtable_and_sstable() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 3, 10);

    // First three land in an SSTable, the next two stay in the memtable.
    engine.put(b"b".to_vec(), b"B".to_vec())?;
    engine.put(b"d".to_vec(), b"D".to_vec())?;
    engine.put(b"f".to_vec(), b"F".to_vec())?; // flush
    engine.put(b"c".to_vec(), b"C".to_vec())?;
    engine.put(b"e".to_vec(), b"E".to_vec())?;
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.memtable_len(), 2);

    assert_eq!(
        engine.get_range(b"a", b"z")?,
        pairs(&[("b", "B"), ("c", "C"), ("d", "D"), ("e", "E"), ("f", "F")])
    );
    Ok(())
}

#[test]
fn range_bounds_are_inclusive() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 1000, 10);

    for k in [b"a", b"b", b"c", b"d"] {
        engine.put(k.to_vec(), k.to_vec())?;
    }

    assert_eq!(
        engine.get_range(b"b", b"c")?,
        pairs(&[("b", "b"), ("c", "c")])
    );
    // Exact single-key range.
    assert_eq!(engine.get_range(b"c", b"c")?, pairs(&[("c", "c")]));
    Ok(())
}

#[test]
fn inverted_range_is_empty() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 1000, 10);
    engine.put(b"k".to_vec(), b"v".to_vec())?;

    assert!(engine.get_range(b"z", b"a")?.is_empty());
    Ok(())
}

#[test]
fn newest_write_wins_within_a_range() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 2, 10);

    engine.put(b"k".to_vec(), b"old".to_vec())?;
    engine.put(b"pad".to_vec(), b"p".to_vec())?; // flush
    engine.put(b"k".to_vec(), b"new".to_vec())?; // memtable shadows the SSTable

    let result = engine.get_range(b"a", b"z")?;
    assert_eq!(result, pairs(&[("k", "new"), ("pad", "p")]));
    Ok(())
}

#[test]
fn tombstones_suppress_keys_in_ranges() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 3, 10);

    engine.put(b"a".to_vec(), b"1".to_vec())?;
    engine.put(b"b".to_vec(), b"2".to_vec())?;
    engine.put(b"c".to_vec(), b"3".to_vec())?; // flush
    engine.delete(b"b".to_vec())?; // memtable tombstone over an SSTable entry

    assert_eq!(
        engine.get_range(b"a", b"z")?,
        pairs(&[("a", "1"), ("c", "3")])
    );
    Ok(())
}

#[test]
fn each_key_appears_at_most_once_and_sorted() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_engine(dir.path(), 1, 10);

    // The same key rewritten across many generations, plus scattered keys.
    for i in 0..5u32 {
        engine.put(b"dup".to_vec(), format!("v{i}").into_bytes())?;
    }
    for k in [b"x", b"m", b"a"] {
        engine.put(k.to_vec(), b"1".to_vec())?;
    }

    let result = engine.get_range(b"a", b"z")?;
    let keys: Vec<&[u8]> = result.iter().map(|(k, _)| k.as_slice()).collect();
    assert_eq!(keys, vec![&b"a"[..], &b"dup"[..], &b"m"[..], &b"x"[..]]);
    assert_eq!(result[1].1, b"v4".to_vec(), "newest duplicate wins");

    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    Ok(())
}

#[test]
fn range_over_empty_engine_is_empty() -> Result<()> {
    let dir = tempdir()?;
    let engine = open_engine(dir.path(), 1000, 10);
    assert!(engine.get_range(b"a", b"z")?.is_empty());
    Ok(())
}
