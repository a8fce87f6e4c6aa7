// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::{mpsc, oneshot};

use crate::core::daemon_msg::DaemonMsg;

const DAEMON_GONE: &str = "ERROR: daemon is shutting down";

async fn ask<T>(
    tx: &mpsc::Sender<DaemonMsg>,
    make: impl FnOnce(oneshot::Sender<T>) -> DaemonMsg,
) -> Option<T> {
    let (reply, rx) = oneshot::channel();
    tx.send(make(reply)).await.ok()?;
    rx.await.ok()
}

fn flatten(out: Option<Result<String, String>>) -> String {
    match out {
        Some(Ok(msg)) => msg,
        Some(Err(e)) => format!("ERROR: {e}"),
        None => DAEMON_GONE.to_string(),
    }
}

/// Routes incoming commands to the daemon and renders its reply.
pub async fn route_command(cmd: &str, tx: &mpsc::Sender<DaemonMsg>) -> String {
    match cmd {
        "activate" => flatten(ask(tx, |reply| DaemonMsg::Activate { reply }).await),
        "deactivate" => flatten(ask(tx, |reply| DaemonMsg::Deactivate { reply }).await),
        "stop" => flatten(ask(tx, |reply| DaemonMsg::StopDaemon { reply }).await),

        cmd if cmd.starts_with("info") => {
            let as_json = cmd.split_whitespace().any(|a| a == "--json");
            match ask(tx, |reply| DaemonMsg::GetInfo { reply }).await {
                Some(snap) if as_json => snap.to_json(),
                Some(snap) => snap.to_text(),
                None => DAEMON_GONE.to_string(),
            }
        }

        _ => format!("ERROR: Unknown command '{}'", cmd),
    }
}
