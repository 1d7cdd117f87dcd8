//! # WAL — Write-Ahead Log
//!
//! Crash-safe durability for the silt storage engine.
//!
//! Every mutation (`PUT` or `DEL`) is serialized into a binary frame and
//! appended to the WAL **before** the corresponding memtable update. The
//! engine calls [`WalWriter::sync`] before acknowledging a write, so an
//! acknowledged operation is always recoverable by replay. After a flush has
//! durably materialized the memtable as an SSTable, the engine calls
//! [`WalWriter::truncate`] to reset the log.
//!
//! ## Binary frame format
//!
//! ```text
//! [record_len: u32 LE][crc32: u32 LE][body ...]
//! ```
//!
//! Body (Put): `[seq: u64][op=0: u8][key_len: u32][key][val_len: u32][value]`
//! Body (Del): `[seq: u64][op=1: u8][key_len: u32][key]`
//!
//! `record_len` includes the 4-byte CRC but **not** itself. All integers are
//! little-endian; keys and values are raw bytes with explicit lengths.
//!
//! ## Torn tails
//!
//! A crash mid-append can leave a partial frame at the end of the log.
//! Replay treats any incomplete tail — missing bytes, an absurd declared
//! length, a CRC mismatch, an unknown op code — as the torn remainder of an
//! unacknowledged write: it stops there and yields only the complete frames
//! before it. This is not an error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wal::{WalReader, WalRecord, WalWriter};
//!
//! let mut w = WalWriter::open("wal.log").unwrap();
//! w.append(&WalRecord::Put {
//!     seq: 1,
//!     key: b"hello".to_vec(),
//!     value: b"world".to_vec(),
//! }).unwrap();
//! w.sync().unwrap();
//! drop(w);
//!
//! let mut r = WalReader::open("wal.log").unwrap();
//! r.replay(|rec| println!("{:?}", rec)).unwrap();
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Op code for a `Put` frame body.
const OP_PUT: u8 = 0;
/// Op code for a `Del` frame body.
const OP_DEL: u8 = 1;

/// Upper bound on a declared frame length. Anything larger is treated as
/// garbage from a torn write rather than a frame worth allocating for.
const MAX_RECORD_LEN: u32 = 64 * 1024 * 1024;

/// A single WAL record: a key-value insertion or a deletion.
///
/// Each record carries the monotonically increasing **sequence number** the
/// engine assigned at commit; batches expand into individual records in
/// commit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    /// A key-value insertion.
    Put {
        /// Sequence number assigned by the engine.
        seq: u64,
        /// The lookup key.
        key: Vec<u8>,
        /// The payload value.
        value: Vec<u8>,
    },
    /// A key deletion (tombstone).
    Del {
        /// Sequence number assigned by the engine.
        seq: u64,
        /// The key to delete.
        key: Vec<u8>,
    },
}

impl WalRecord {
    /// The sequence number carried by this record.
    pub fn seq(&self) -> u64 {
        match self {
            WalRecord::Put { seq, .. } | WalRecord::Del { seq, .. } => *seq,
        }
    }
}

/// Errors from WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error: the append or sync did not take effect.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A frame passed its checksum but its body could not be parsed. Not
    /// producible by this writer; indicates foreign or rewritten bytes.
    #[error("corrupt record body")]
    Corrupt,
}

/// Append-only WAL writer.
///
/// Frames are serialized into a reusable in-memory buffer, checksummed, and
/// written with a single `write_all`. [`append`](WalWriter::append) flushes
/// the userspace buffer but does **not** fsync; durability is requested
/// explicitly via [`sync`](WalWriter::sync) so that a batch of appends can
/// share one fsync.
pub struct WalWriter {
    file: File,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl WalWriter {
    /// Opens (or creates) a WAL file in append mode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;
        Ok(Self {
            file,
            buf: Vec::with_capacity(256),
        })
    }

    /// Serializes `record` and appends its frame to the WAL file.
    ///
    /// The frame reaches the operating system (`write_all` + `flush`) but is
    /// not yet durable; call [`sync`](WalWriter::sync) before acknowledging.
    pub fn append(&mut self, record: &WalRecord) -> Result<(), WalError> {
        self.buf.clear();

        // Reserve 8 bytes for the frame header (record_len + crc), filled below.
        self.buf.extend_from_slice(&[0u8; 8]);

        match record {
            WalRecord::Put { seq, key, value } => {
                self.buf.write_u64::<LittleEndian>(*seq)?;
                self.buf.write_u8(OP_PUT)?;
                self.buf.write_u32::<LittleEndian>(key.len() as u32)?;
                self.buf.extend_from_slice(key);
                self.buf.write_u32::<LittleEndian>(value.len() as u32)?;
                self.buf.extend_from_slice(value);
            }
            WalRecord::Del { seq, key } => {
                self.buf.write_u64::<LittleEndian>(*seq)?;
                self.buf.write_u8(OP_DEL)?;
                self.buf.write_u32::<LittleEndian>(key.len() as u32)?;
                self.buf.extend_from_slice(key);
            }
        }

        let body = &self.buf[8..];
        let mut hasher = Crc32::new();
        hasher.update(body);
        let crc = hasher.finalize();

        // record_len = body + 4 (CRC), must fit in u32.
        let record_len = (body.len() as u64) + 4;
        if record_len > u64::from(u32::MAX) {
            return Err(WalError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "WAL record too large",
            )));
        }

        self.buf[0..4].copy_from_slice(&(record_len as u32).to_le_bytes());
        self.buf[4..8].copy_from_slice(&crc.to_le_bytes());

        // Single write call for the entire frame.
        self.file.write_all(&self.buf)?;
        self.file.flush()?;
        Ok(())
    }

    /// Forces everything appended so far onto stable storage (`fsync`).
    ///
    /// Returns only after the data is durable. The engine calls this once
    /// per write, or once per batch after the last frame.
    pub fn sync(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Truncates the log to zero length and syncs the truncation.
    ///
    /// Called only after the entries the log covers have been durably
    /// materialized as an SSTable. The handle stays open in append mode, so
    /// subsequent appends start at the new (zero) end of file.
    pub fn truncate(&mut self) -> Result<(), WalError> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Sequential WAL reader yielding complete, checksum-valid records.
///
/// Generic over any `Read` implementor so tests can replay from an
/// in-memory buffer.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
}

impl WalReader<File> {
    /// Opens an existing WAL file for sequential replay.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> WalReader<R> {
    /// Constructs a reader from any `Read` implementor.
    pub fn from_reader(reader: R) -> Self {
        WalReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Replays every complete record, calling `apply` for each one.
    ///
    /// Termination:
    /// - clean EOF -> `Ok(())`;
    /// - torn tail (missing bytes, absurd length, CRC mismatch, unknown op)
    ///   -> `Ok(())` after yielding all complete records before it;
    /// - I/O error -> `Err(WalError::Io)`.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(WalRecord),
    {
        // Reusable body buffer.
        let mut body = Vec::with_capacity(256);

        loop {
            let record_len = match self.rdr.read_u32::<LittleEndian>() {
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(WalError::Io(e)),
            };

            // record_len includes the CRC (4 bytes) but not itself. A length
            // that cannot hold a body, or one past the safety cap, is a torn
            // write, not a frame.
            if record_len <= 4 || record_len > MAX_RECORD_LEN {
                tracing::warn!(record_len, "discarding torn wal tail (bad frame length)");
                return Ok(());
            }

            let crc = match self.rdr.read_u32::<LittleEndian>() {
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(WalError::Io(e)),
            };

            let body_len = (record_len - 4) as usize;
            body.clear();
            body.resize(body_len, 0);
            match self.rdr.read_exact(&mut body) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(WalError::Io(e)),
            }

            let mut hasher = Crc32::new();
            hasher.update(&body);
            if hasher.finalize() != crc {
                tracing::warn!("discarding torn wal tail (checksum mismatch)");
                return Ok(());
            }

            match Self::parse_body(&body)? {
                Some(record) => apply(record),
                None => {
                    tracing::warn!("discarding torn wal tail (unknown op code)");
                    return Ok(());
                }
            }
        }
    }

    /// Parses a checksum-valid body. Returns `Ok(None)` for an unknown op
    /// code (the caller stops replay there).
    fn parse_body(body: &[u8]) -> Result<Option<WalRecord>, WalError> {
        let mut br = body;
        let seq = br.read_u64::<LittleEndian>().map_err(|_| WalError::Corrupt)?;
        let op = br.read_u8().map_err(|_| WalError::Corrupt)?;
        let key_len = br.read_u32::<LittleEndian>().map_err(|_| WalError::Corrupt)? as usize;
        if key_len > br.len() {
            return Err(WalError::Corrupt);
        }
        let mut key = vec![0u8; key_len];
        br.read_exact(&mut key).map_err(|_| WalError::Corrupt)?;

        match op {
            OP_PUT => {
                let val_len =
                    br.read_u32::<LittleEndian>().map_err(|_| WalError::Corrupt)? as usize;
                if val_len > br.len() {
                    return Err(WalError::Corrupt);
                }
                let mut value = vec![0u8; val_len];
                br.read_exact(&mut value).map_err(|_| WalError::Corrupt)?;
                Ok(Some(WalRecord::Put { seq, key, value }))
            }
            OP_DEL => Ok(Some(WalRecord::Del { seq, key })),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests;
