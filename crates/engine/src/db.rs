//! The shared engine handle.
//!
//! Rust has no reentrant mutex that hands out `&mut` access, so the
//! engine's single-lock discipline is a public/internal split: every public
//! operation on [`Db`] locks the one mutex and calls the corresponding
//! `&mut self` engine method; the internal `flush` and `compact` routines
//! are invoked from the write path with the lock already held and never
//! lock again.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::Result;
use crate::{Config, Engine};

/// Cloneable, thread-safe handle to an [`Engine`].
///
/// A single mutex serializes **every** operation — reads included — end to
/// end. Writes are linearizable; a read observes exactly the writes that
/// completed before it acquired the lock. The cost is that no two
/// operations overlap: a flush or compaction on one connection's write
/// blocks every other caller until it finishes, and an operation cannot be
/// cancelled once it holds the lock. That trade is deliberate — simple,
/// predictable semantics over read parallelism.
#[derive(Clone)]
pub struct Db {
    inner: Arc<Mutex<Engine>>,
}

impl Db {
    /// Opens the engine (running recovery) and wraps it for shared use.
    pub fn open(config: Config) -> Result<Self> {
        let engine = Engine::open(config)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(engine)),
        })
    }

    /// See [`Engine::put`].
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.inner.lock().put(key, value)
    }

    /// See [`Engine::get`].
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.lock().get(key)
    }

    /// See [`Engine::delete`].
    pub fn delete(&self, key: Vec<u8>) -> Result<()> {
        self.inner.lock().delete(key)
    }

    /// See [`Engine::batch_put`].
    pub fn batch_put(&self, keys: Vec<Vec<u8>>, values: Vec<Vec<u8>>) -> Result<()> {
        self.inner.lock().batch_put(keys, values)
    }

    /// See [`Engine::get_range`].
    pub fn get_range(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.inner.lock().get_range(start, end)
    }

    /// See [`Engine::close`].
    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }

    /// Runs `f` with the engine locked, for inspection in tests and stats.
    pub fn with_engine<T>(&self, f: impl FnOnce(&Engine) -> T) -> T {
        f(&self.inner.lock())
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Some(engine) => engine.fmt(f),
            None => f.write_str("Db { <locked> }"),
        }
    }
}
