use super::*;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Cursor;
use tempfile::tempdir;

fn collect_records<R: Read>(reader: &mut WalReader<R>) -> Vec<WalRecord> {
    let mut out = Vec::new();
    reader.replay(|r| out.push(r)).unwrap();
    out
}

#[test]
fn append_and_replay_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");

    {
        let mut w = WalWriter::open(&path).unwrap();
        w.append(&WalRecord::Put {
            seq: 1,
            key: b"alpha".to_vec(),
            value: b"1".to_vec(),
        })
        .unwrap();
        w.append(&WalRecord::Del {
            seq: 2,
            key: b"alpha".to_vec(),
        })
        .unwrap();
        w.append(&WalRecord::Put {
            seq: 3,
            key: b"beta".to_vec(),
            value: b"".to_vec(), // empty value is legal
        })
        .unwrap();
        w.sync().unwrap();
    }

    let mut r = WalReader::open(&path).unwrap();
    let records = collect_records(&mut r);

    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0],
        WalRecord::Put {
            seq: 1,
            key: b"alpha".to_vec(),
            value: b"1".to_vec(),
        }
    );
    assert_eq!(
        records[1],
        WalRecord::Del {
            seq: 2,
            key: b"alpha".to_vec(),
        }
    );
    assert_eq!(records[2].seq(), 3);
}

#[test]
fn replay_of_empty_log_yields_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let _ = WalWriter::open(&path).unwrap();

    let mut r = WalReader::open(&path).unwrap();
    assert!(collect_records(&mut r).is_empty());
}

#[test]
fn truncated_tail_is_dropped_without_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");

    {
        let mut w = WalWriter::open(&path).unwrap();
        w.append(&WalRecord::Put {
            seq: 1,
            key: b"k".to_vec(),
            value: b"v".to_vec(),
        })
        .unwrap();
        w.sync().unwrap();
    }

    // Simulate a crash mid-append: a frame header with only half a body.
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.write_u32::<LittleEndian>(40).unwrap(); // declares 36-byte body
    bytes.write_u32::<LittleEndian>(0xdead_beef).unwrap();
    bytes.extend_from_slice(&[0u8; 10]);
    std::fs::write(&path, &bytes).unwrap();

    let mut r = WalReader::open(&path).unwrap();
    let records = collect_records(&mut r);
    assert_eq!(records.len(), 1, "only the complete frame survives");
    assert_eq!(records[0].seq(), 1);
}

#[test]
fn checksum_mismatch_stops_replay_at_last_good_record() {
    // Two complete frames, the second with a corrupted CRC. Replay must
    // yield the first and stop silently.
    let mut bytes = Vec::new();

    let frame = |seq: u64, crc_override: Option<u32>, out: &mut Vec<u8>| {
        let mut body = Vec::new();
        body.write_u64::<LittleEndian>(seq).unwrap();
        body.write_u8(0).unwrap(); // op = put
        body.write_u32::<LittleEndian>(1).unwrap();
        body.extend_from_slice(b"k");
        body.write_u32::<LittleEndian>(1).unwrap();
        body.extend_from_slice(b"v");

        let mut hasher = Crc32::new();
        hasher.update(&body);
        let crc = crc_override.unwrap_or_else(|| hasher.finalize());

        out.write_u32::<LittleEndian>((body.len() + 4) as u32).unwrap();
        out.write_u32::<LittleEndian>(crc).unwrap();
        out.extend_from_slice(&body);
    };

    frame(1, None, &mut bytes);
    frame(2, Some(0), &mut bytes); // bogus CRC

    let mut r = WalReader::from_reader(Cursor::new(bytes));
    let records = collect_records(&mut r);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].seq(), 1);
}

#[test]
fn absurd_frame_length_is_treated_as_torn_tail() {
    let mut bytes = Vec::new();
    bytes.write_u32::<LittleEndian>(u32::MAX).unwrap();
    bytes.extend_from_slice(&[1, 2, 3, 4]);

    let mut r = WalReader::from_reader(Cursor::new(bytes));
    assert!(collect_records(&mut r).is_empty());
}

#[test]
fn truncate_resets_log_to_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");

    let mut w = WalWriter::open(&path).unwrap();
    w.append(&WalRecord::Put {
        seq: 1,
        key: b"k".to_vec(),
        value: b"v".to_vec(),
    })
    .unwrap();
    w.sync().unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);

    w.truncate().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

    // The handle is still usable after truncation.
    w.append(&WalRecord::Put {
        seq: 2,
        key: b"k2".to_vec(),
        value: b"v2".to_vec(),
    })
    .unwrap();
    w.sync().unwrap();

    let mut r = WalReader::open(&path).unwrap();
    let records = collect_records(&mut r);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].seq(), 2);
}

#[test]
fn batch_of_appends_replays_in_commit_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");

    {
        let mut w = WalWriter::open(&path).unwrap();
        for seq in 1..=5u64 {
            w.append(&WalRecord::Put {
                seq,
                key: format!("k{seq}").into_bytes(),
                value: format!("v{seq}").into_bytes(),
            })
            .unwrap();
        }
        // One sync for the whole batch.
        w.sync().unwrap();
    }

    let mut r = WalReader::open(&path).unwrap();
    let seqs: Vec<u64> = collect_records(&mut r).iter().map(|r| r.seq()).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
}
