// Author: Dustin Pilgrim
// License: MIT

use std::io;
use std::path::Path;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::mpsc,
    time::{Duration, timeout},
};

use crate::core::daemon_msg::DaemonMsg;
use crate::{sdebug, serror};

use super::router::route_command;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Bind the control socket and serve it in the background.
pub async fn spawn_ipc_server(tx: mpsc::Sender<DaemonMsg>, log_id: String) -> io::Result<()> {
    let path = super::socket_path().map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
    let listener = bind(&path)?;
    sdebug!(&log_id, "ipc: listening on {}", path.display());

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut stream, _addr)) => {
                    let tx = tx.clone();
                    let log_id = log_id.clone();

                    tokio::spawn(async move {
                        let result = timeout(CONNECTION_TIMEOUT, async {
                            if let Err(e) = handle_connection(&mut stream, &tx, &log_id).await {
                                serror!(&log_id, "Error handling IPC connection: {}", e);
                            }
                        })
                        .await;

                        if result.is_err() {
                            serror!(&log_id, "IPC connection timed out after 10 seconds");
                        }

                        let _ = stream.shutdown().await;
                    });
                }
                Err(e) => serror!(&log_id, "Failed to accept IPC connection: {}", e),
            }
        }
    });

    Ok(())
}

/// The single-instance lock is held by the time we get here, so a leftover
/// socket file belongs to a dead daemon.
fn bind(path: &Path) -> io::Result<UnixListener> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    UnixListener::bind(path)
}

async fn handle_connection(
    stream: &mut UnixStream,
    tx: &mpsc::Sender<DaemonMsg>,
    log_id: &str,
) -> io::Result<()> {
    let mut buf = vec![0u8; 256];
    let n = stream.read(&mut buf).await?;

    if n == 0 {
        return Ok(());
    }

    let cmd = String::from_utf8_lossy(&buf[..n]).trim().to_string();
    sdebug!(log_id, "Received IPC command: {}", cmd);

    let response = route_command(&cmd, tx).await;

    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;

    Ok(())
}
