
use memtable::ValueEntry;

/// Builds a sorted entry list from `(key, Some(value) | None)` pairs,
/// assigning ascending sequence numbers.
pub(crate) fn entries(pairs: &[(&[u8], Option<&[u8]>)]) -> Vec<(Vec<u8>, ValueEntry)> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (k, v))| {
            (
                k.to_vec(),
                ValueEntry {
                    seq: i as u64 + 1,
                    value: v.map(|v| v.to_vec()),
                },
            )
        })
        .collect()
}
