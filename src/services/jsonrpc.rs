// Author: Dustin Pilgrim
// License: MIT

//! Raw JSON-RPC over TCP. The host writes concatenated JSON objects with no
//! framing, mixing responses to our requests with unsolicited notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::core::host::HostError;

const CALL_TIMEOUT: Duration = Duration::from_secs(10);
const READ_CHUNK: usize = 8192;

/// What the reader task hands to the connection owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Notification { method: String },
    Closed,
}

pub struct RpcConnection {
    writer: Mutex<OwnedWriteHalf>,
    responses: Mutex<mpsc::UnboundedReceiver<Value>>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl RpcConnection {
    pub async fn connect(
        addr: &str,
    ) -> std::io::Result<(Self, mpsc::UnboundedReceiver<Incoming>)> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();

        let (resp_tx, resp_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_loop(reader, resp_tx, incoming_tx));

        Ok((
            Self {
                writer: Mutex::new(writer),
                responses: Mutex::new(resp_rx),
                next_id: AtomicU64::new(1),
                reader,
            },
            incoming_rx,
        ))
    }

    /// Send one request and wait for the response carrying its id.
    ///
    /// The id on the wire is unique per connection; the caller's own id is
    /// put back on the response. Replies to earlier calls that timed out are
    /// dropped.
    pub async fn call(&self, payload: &str) -> Result<String, HostError> {
        let mut request: Value = serde_json::from_str(payload)
            .map_err(|e| HostError::Protocol(format!("bad request: {e}")))?;
        let Some(fields) = request.as_object_mut() else {
            return Err(HostError::Protocol("request is not an object".into()));
        };

        let wire_id = Value::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        let caller_id = fields.insert("id".to_string(), wire_id.clone());

        let mut responses = self.responses.lock().await;
        {
            let mut writer = self.writer.lock().await;
            writer.write_all(request.to_string().as_bytes()).await?;
            writer.flush().await?;
        }

        let deadline = Instant::now() + CALL_TIMEOUT;
        let mut response = loop {
            match tokio::time::timeout_at(deadline, responses.recv()).await {
                Ok(Some(value)) if value.get("id") == Some(&wire_id) => break value,
                Ok(Some(_stale)) => continue,
                Ok(None) => return Err(HostError::Disconnected),
                Err(_) => return Err(HostError::Timeout),
            }
        };

        if let Some(fields) = response.as_object_mut() {
            match caller_id {
                Some(id) => fields.insert("id".to_string(), id),
                None => fields.remove("id"),
            };
        }
        Ok(response.to_string())
    }
}

impl Drop for RpcConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    responses: mpsc::UnboundedSender<Value>,
    incoming: mpsc::UnboundedSender<Incoming>,
) {
    let mut pending = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        pending.extend_from_slice(&chunk[..n]);

        for value in split_messages(&mut pending) {
            match notification_method(&value) {
                Some(method) => {
                    let _ = incoming.send(Incoming::Notification {
                        method: method.to_string(),
                    });
                }
                None => {
                    let _ = responses.send(value);
                }
            }
        }
    }

    let _ = incoming.send(Incoming::Closed);
}

/// Pull every complete JSON value off the front of `pending`, leaving a
/// trailing partial value in place. Unparsable input is skipped up to the
/// next `{` so one bad message does not take the ones behind it.
pub fn split_messages(pending: &mut Vec<u8>) -> Vec<Value> {
    let mut values = Vec::new();
    loop {
        let (consumed, broken) = {
            let mut stream = serde_json::Deserializer::from_slice(pending).into_iter::<Value>();
            loop {
                let offset = stream.byte_offset();
                match stream.next() {
                    Some(Ok(value)) => values.push(value),
                    Some(Err(e)) if e.is_eof() => break (offset, false),
                    Some(Err(_)) => break (offset, true),
                    None => break (stream.byte_offset(), false),
                }
            }
        };
        pending.drain(..consumed);

        if !broken {
            return values;
        }
        match pending.iter().skip(1).position(|b| *b == b'{') {
            Some(n) => {
                pending.drain(..=n);
            }
            None => {
                pending.clear();
                return values;
            }
        }
    }
}

/// Notifications carry a method but no id.
pub fn notification_method(value: &Value) -> Option<&str> {
    if value.get("id").is_some() {
        return None;
    }
    value.get("method").and_then(Value::as_str)
}
