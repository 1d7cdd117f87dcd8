//! # Server — the silt network front end
//!
//! Exposes the storage engine over TCP with a newline-delimited JSON
//! protocol. The engine itself is protocol-agnostic; this crate owns the
//! whole wire contract.
//!
//! ## Protocol
//!
//! One JSON object per line, in both directions. Requests carry a `command`
//! field plus command-specific fields; responses carry `status` (`ok` or
//! `error`) with either a `result` payload or a `message`:
//!
//! ```text
//! -> {"command":"put","key":"name","value":"Alice"}
//! <- {"status":"ok","result":true}
//! -> {"command":"get","key":"name"}
//! <- {"status":"ok","result":"Alice"}
//! -> {"command":"get","key":"missing"}
//! <- {"status":"ok","result":null}
//! -> {"command":"get_range","start_key":"a","end_key":"z"}
//! <- {"status":"ok","result":[["name","Alice"]]}
//! -> not json
//! <- {"status":"error","message":"invalid request: ..."}
//! ```
//!
//! A malformed request is answered at the protocol layer and never reaches
//! the engine. Each connection gets its own thread; the engine's internal
//! mutex serializes the actual operations.

mod client;
mod protocol;
mod server;

pub use client::Client;
pub use protocol::{Request, Response};
pub use server::Server;
