// Author: Dustin Pilgrim
// License: MIT

//! Seams between the session logic and the outside world.

use std::fmt;
use std::future::Future;
use std::io;

/// A short-lived pop-up shown by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub heading: String,
    pub message: String,
    pub icon: String,
    pub delay_ms: u64,
}

/// Result of a finished external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// stdout and stderr, interleaved as the process wrote them.
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// No live connection to the host.
    Disconnected,
    Timeout,
    Io(String),
    Protocol(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Disconnected => write!(f, "not connected to host"),
            HostError::Timeout => write!(f, "host did not answer in time"),
            HostError::Io(e) => write!(f, "I/O error: {e}"),
            HostError::Protocol(e) => write!(f, "protocol error: {e}"),
        }
    }
}

impl std::error::Error for HostError {}

impl From<io::Error> for HostError {
    fn from(err: io::Error) -> Self {
        HostError::Io(err.to_string())
    }
}

/// Services the media center exposes to us.
pub trait Host: Send + Sync {
    /// Run an opaque built-in command string.
    fn execute_builtin(&self, command: &str) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Send a serialized JSON-RPC request and return the raw response text.
    fn execute_json_rpc(&self, payload: &str)
    -> impl Future<Output = Result<String, HostError>> + Send;

    fn notify(&self, notification: &Notification)
    -> impl Future<Output = Result<(), HostError>> + Send;
}

/// Spawns OS processes and waits for them.
pub trait CommandRunner: Send + Sync {
    /// `Err` means the process could not be launched.
    fn run(&self, argv: &[&str]) -> impl Future<Output = io::Result<CommandOutput>> + Send;
}
