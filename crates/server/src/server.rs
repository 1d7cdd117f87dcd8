//! TCP listener and per-connection request loop.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;

use engine::Db;
use serde_json::{json, Value};

use crate::protocol::{Request, Response};

/// Accepts connections and serves the engine over the line-JSON protocol.
///
/// Each connection is handled on its own thread; the shared [`Db`] handle
/// serializes engine access internally, so handler threads need no
/// coordination of their own.
pub struct Server {
    listener: TcpListener,
    db: Db,
}

impl Server {
    /// Binds to `addr` without accepting yet.
    pub fn bind<A: ToSocketAddrs>(addr: A, db: Db) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self { listener, db })
    }

    /// The bound address (useful when binding to port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts and serves connections until the process exits.
    pub fn run(self) -> io::Result<()> {
        tracing::info!(addr = %self.listener.local_addr()?, "listening");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let db = self.db.clone();
                    thread::spawn(move || {
                        if let Err(e) = handle_client(db, stream) {
                            tracing::warn!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
            }
        }
        Ok(())
    }
}

/// Reads requests line by line and answers each on the same connection.
fn handle_client(db: Db, stream: TcpStream) -> io::Result<()> {
    let peer = stream.peer_addr()?;
    tracing::info!(%peer, "client connected");

    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        // Malformed requests are answered here; the engine is never called.
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatch(&db, request),
            Err(e) => Response::error(format!("invalid request: {e}")),
        };

        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        writer.write_all(&payload)?;
    }

    tracing::info!(%peer, "client disconnected");
    Ok(())
}

/// Translates one request into an engine call and the result into a
/// response. Engine errors become `{"status":"error"}` messages.
pub fn dispatch(db: &Db, request: Request) -> Response {
    match request {
        Request::Put { key, value } => {
            match db.put(key.into_bytes(), value.into_bytes()) {
                Ok(()) => Response::ok(json!(true)),
                Err(e) => Response::error(e.to_string()),
            }
        }
        Request::Get { key } => match db.get(key.as_bytes()) {
            Ok(Some(value)) => {
                Response::ok(Value::String(String::from_utf8_lossy(&value).into_owned()))
            }
            Ok(None) => Response::ok(Value::Null),
            Err(e) => Response::error(e.to_string()),
        },
        Request::Delete { key } => match db.delete(key.into_bytes()) {
            Ok(()) => Response::ok(json!(true)),
            Err(e) => Response::error(e.to_string()),
        },
        Request::BatchPut { keys, values } => {
            let keys = keys.into_iter().map(String::into_bytes).collect();
            let values = values.into_iter().map(String::into_bytes).collect();
            match db.batch_put(keys, values) {
                Ok(()) => Response::ok(json!(true)),
                Err(e) => Response::error(e.to_string()),
            }
        }
        Request::GetRange { start_key, end_key } => {
            match db.get_range(start_key.as_bytes(), end_key.as_bytes()) {
                Ok(pairs) => {
                    let result: Vec<Value> = pairs
                        .into_iter()
                        .map(|(k, v)| {
                            json!([
                                String::from_utf8_lossy(&k).into_owned(),
                                String::from_utf8_lossy(&v).into_owned()
                            ])
                        })
                        .collect();
                    Response::ok(Value::Array(result))
                }
                Err(e) => Response::error(e.to_string()),
            }
        }
    }
}
