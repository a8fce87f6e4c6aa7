// Author: Dustin Pilgrim
// License: MIT

//! Client side of the control socket: one command out, one reply back.

use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::UnixStream,
    time::{Duration, timeout},
};

const IO_TIMEOUT: Duration = Duration::from_secs(2);

// Activation runs external commands before the daemon answers; the server
// gives up on a connection after 10 s.
const REPLY_TIMEOUT: Duration = Duration::from_secs(11);

#[derive(Debug)]
pub enum ClientError {
    NoRuntimeDir(String),
    NotRunning(PathBuf),
    Io { step: &'static str, source: io::Error },
    TimedOut { step: &'static str },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::NoRuntimeDir(msg) => write!(f, "cannot locate the daemon socket: {}", msg),
            ClientError::NotRunning(path) => {
                write!(f, "daemon not running (no socket at {})", path.display())
            }
            ClientError::Io { step, source } => write!(f, "{} failed: {}", step, source),
            ClientError::TimedOut { step } => write!(f, "timed out {}", step),
        }
    }
}

impl std::error::Error for ClientError {}

async fn step<T>(
    limit: Duration,
    what: &'static str,
    fut: impl Future<Output = io::Result<T>>,
) -> Result<T, ClientError> {
    match timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(ClientError::Io { step: what, source }),
        Err(_) => Err(ClientError::TimedOut { step: what }),
    }
}

/// Send `cmd` to the running daemon and return its reply text.
pub async fn request(cmd: &str) -> Result<String, ClientError> {
    let path = crate::ipc::socket_path().map_err(ClientError::NoRuntimeDir)?;
    request_at(&path, cmd).await
}

pub async fn request_at(path: &Path, cmd: &str) -> Result<String, ClientError> {
    if !path.exists() {
        return Err(ClientError::NotRunning(path.to_path_buf()));
    }

    let mut stream = step(IO_TIMEOUT, "connecting", UnixStream::connect(path)).await?;

    // The server reads until EOF, so the write half is closed after the command.
    step(IO_TIMEOUT, "sending the request", async {
        stream.write_all(cmd.as_bytes()).await?;
        stream.shutdown().await
    })
    .await?;

    let mut reply = Vec::new();
    step(REPLY_TIMEOUT, "waiting for the reply", stream.read_to_end(&mut reply)).await?;

    Ok(String::from_utf8_lossy(&reply).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn missing_socket_means_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turnoff.sock");

        let err = request_at(&path, "info").await.unwrap_err();
        assert!(matches!(err, ClientError::NotRunning(_)));
        assert!(err.to_string().contains("turnoff.sock"));
    }

    #[tokio::test]
    async fn sends_command_and_reads_reply_until_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turnoff.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut cmd = String::new();
            sock.read_to_string(&mut cmd).await.unwrap();
            sock.write_all(b"Deactivation delivered\n").await.unwrap();
            cmd
        });

        let reply = request_at(&path, "deactivate").await.unwrap();
        assert_eq!(reply, "Deactivation delivered\n");
        assert_eq!(server.await.unwrap(), "deactivate");
    }

    #[tokio::test]
    async fn stale_socket_file_fails_to_connect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turnoff.sock");
        drop(UnixListener::bind(&path).unwrap());

        let err = request_at(&path, "stop").await.unwrap_err();
        assert!(matches!(err, ClientError::Io { step: "connecting", .. }), "{err}");
    }
}
