//! Blocking client for the line-JSON protocol.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use crate::protocol::{Request, Response};

/// A connection to a silt server.
///
/// Methods mirror the engine's operation vocabulary; an error response from
/// the server surfaces as an `Err` carrying the server's message.
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    /// Connects to a server at `addr`.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).context("failed to connect")?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }

    /// Stores a key-value pair.
    pub fn put(&mut self, key: &str, value: &str) -> Result<()> {
        let response = self.request(&Request::Put {
            key: key.into(),
            value: value.into(),
        })?;
        expect_ok(response).map(|_| ())
    }

    /// Looks up a key; `None` means absent or deleted.
    pub fn get(&mut self, key: &str) -> Result<Option<String>> {
        let response = self.request(&Request::Get { key: key.into() })?;
        match expect_ok(response)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => bail!("unexpected get result: {other}"),
        }
    }

    /// Deletes a key.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let response = self.request(&Request::Delete { key: key.into() })?;
        expect_ok(response).map(|_| ())
    }

    /// Stores several pairs, durable as a unit.
    pub fn batch_put(&mut self, keys: &[&str], values: &[&str]) -> Result<()> {
        let response = self.request(&Request::BatchPut {
            keys: keys.iter().map(|s| s.to_string()).collect(),
            values: values.iter().map(|s| s.to_string()).collect(),
        })?;
        expect_ok(response).map(|_| ())
    }

    /// All pairs with `start <= key <= end`, ascending.
    pub fn get_range(&mut self, start: &str, end: &str) -> Result<Vec<(String, String)>> {
        let response = self.request(&Request::GetRange {
            start_key: start.into(),
            end_key: end.into(),
        })?;
        let Value::Array(items) = expect_ok(response)? else {
            bail!("unexpected get_range result");
        };

        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            let Value::Array(pair) = item else {
                bail!("unexpected get_range entry");
            };
            match (pair.first(), pair.get(1)) {
                (Some(Value::String(k)), Some(Value::String(v))) => {
                    pairs.push((k.clone(), v.clone()));
                }
                _ => bail!("unexpected get_range entry"),
            }
        }
        Ok(pairs)
    }

    /// Sends one request line and reads one response line.
    fn request(&mut self, request: &Request) -> Result<Response> {
        let mut payload = serde_json::to_vec(request)?;
        payload.push(b'\n');
        self.writer.write_all(&payload)?;

        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            bail!("server closed the connection");
        }
        serde_json::from_str(&line).context("malformed response from server")
    }
}

/// Unwraps an `ok` response into its result, or turns an error response
/// into an `Err`.
fn expect_ok(response: Response) -> Result<Value> {
    match response {
        Response::Ok { result } => Ok(result),
        Response::Error { message } => Err(anyhow!("server error: {message}")),
    }
}
