//! silt-server: network front end for the silt storage engine.
//!
//! Configuration is via environment variables with sensible defaults:
//!
//! ```text
//! SILT_ADDR                  listen address        (default: 127.0.0.1:9999)
//! SILT_DATA_DIR              data directory        (default: data)
//! SILT_MEMTABLE_SIZE         flush threshold       (default: 1000 entries)
//! SILT_COMPACTION_THRESHOLD  compaction threshold  (default: 10 sstables)
//! RUST_LOG                   tracing filter        (default: info)
//! ```
//!
//! ## Example
//!
//! ```text
//! $ SILT_DATA_DIR=/var/lib/silt silt-server
//! INFO engine recovered data_dir=/var/lib/silt sstables=3 replayed=17 seq=4211
//! INFO listening addr=127.0.0.1:9999
//! ```

use anyhow::{Context, Result};
use engine::{Config, Db};
use server::Server;
use tracing_subscriber::EnvFilter;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = env_or("SILT_ADDR", "127.0.0.1:9999");
    let data_dir = env_or("SILT_DATA_DIR", "data");
    let memtable_size: usize = env_or("SILT_MEMTABLE_SIZE", "1000")
        .parse()
        .context("SILT_MEMTABLE_SIZE must be a positive integer")?;
    let compaction_threshold: usize = env_or("SILT_COMPACTION_THRESHOLD", "10")
        .parse()
        .context("SILT_COMPACTION_THRESHOLD must be a positive integer")?;

    let db = Db::open(
        Config::new(&data_dir)
            .memtable_size(memtable_size)
            .compaction_threshold(compaction_threshold),
    )
    .with_context(|| format!("failed to open engine in {data_dir}"))?;

    let server = Server::bind(&addr, db).with_context(|| format!("failed to bind {addr}"))?;
    server.run()?;
    Ok(())
}
