// Author: Dustin Pilgrim
// License: MIT

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::{RwLock, mpsc::Sender};

use crate::config::model::{AddonInfo, KodiConfig};
use crate::core::daemon_msg::DaemonMsg;
use crate::core::events::Event;
use crate::core::host::{Host, HostError, Notification};
use crate::services::eventserver::EventClient;
use crate::services::jsonrpc::{Incoming, RpcConnection};
use crate::{sdebug, sinfo, swarn};

/// Backoff between connection attempts, in milliseconds. The last entry repeats.
const RETRY_DELAYS_MS: [u64; 4] = [0, 1000, 2000, 5000];

/// The running media center, reached over JSON-RPC (TCP) and the
/// EventServer (UDP).
pub struct KodiHost {
    rpc_addr: String,
    log_id: String,
    rpc: RwLock<Option<Arc<RpcConnection>>>,
    events: EventClient,
}

impl KodiHost {
    pub fn new(config: &KodiConfig, addon: &AddonInfo) -> Self {
        Self {
            rpc_addr: format!("{}:{}", config.host, config.rpc_port),
            log_id: addon.id.clone(),
            rpc: RwLock::new(None),
            events: EventClient::new(
                format!("{}:{}", config.host, config.eventserver_port),
                addon.name.clone(),
            ),
        }
    }

    async fn set_connection(&self, conn: Option<Arc<RpcConnection>>) {
        *self.rpc.write().await = conn;
    }

    async fn connection(&self) -> Option<Arc<RpcConnection>> {
        self.rpc.read().await.clone()
    }
}

pub fn notification_request(n: &Notification) -> Value {
    let mut params = json!({
        "title": n.heading,
        "message": n.message,
        "displaytime": n.delay_ms,
    });
    if !n.icon.is_empty() {
        params["image"] = Value::from(n.icon.as_str());
    }
    json!({
        "id": 1,
        "jsonrpc": "2.0",
        "method": "GUI.ShowNotification",
        "params": params,
    })
}

impl Host for KodiHost {
    async fn execute_builtin(&self, command: &str) -> Result<(), HostError> {
        self.events.send_builtin(command).await
    }

    async fn execute_json_rpc(&self, payload: &str) -> Result<String, HostError> {
        let conn = self.connection().await.ok_or(HostError::Disconnected)?;
        conn.call(payload).await
    }

    async fn notify(&self, notification: &Notification) -> Result<(), HostError> {
        let request = notification_request(notification).to_string();
        let response = self.execute_json_rpc(&request).await?;

        let value: Value = serde_json::from_str(&response)
            .map_err(|e| HostError::Protocol(e.to_string()))?;
        match value.get("error") {
            Some(err) => Err(HostError::Protocol(err.to_string())),
            None => Ok(()),
        }
    }
}

/// Keep a JSON-RPC connection to the host alive and forward the
/// notifications the daemon cares about. Returns when the daemon is gone.
pub async fn run_connection(host: Arc<KodiHost>, tx: Sender<DaemonMsg>) {
    let mut attempt = 0usize;

    loop {
        let delay = RETRY_DELAYS_MS[attempt.min(RETRY_DELAYS_MS.len() - 1)];
        if delay > 0 {
            sdebug!(&host.log_id, "Retrying host connection in {}s", delay / 1000);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let (conn, mut incoming) = match RpcConnection::connect(&host.rpc_addr).await {
            Ok(pair) => pair,
            Err(e) => {
                if attempt == 0 {
                    swarn!(&host.log_id, "Cannot connect to host at {}: {}", host.rpc_addr, e);
                }
                attempt += 1;
                continue;
            }
        };

        sinfo!(&host.log_id, "Connected to host at {}", host.rpc_addr);
        host.set_connection(Some(Arc::new(conn))).await;
        if tx.send(DaemonMsg::Event(Event::HostConnected)).await.is_err() {
            return;
        }

        while let Some(msg) = incoming.recv().await {
            match msg {
                Incoming::Notification { method } => {
                    sdebug!(&host.log_id, "Host notification {}", method);
                    if let Some(event) = Event::from_notification(&method) {
                        if tx.send(DaemonMsg::Event(event)).await.is_err() {
                            return;
                        }
                    }
                }
                Incoming::Closed => break,
            }
        }

        host.set_connection(None).await;
        swarn!(&host.log_id, "Connection to host at {} lost", host.rpc_addr);
        if tx.send(DaemonMsg::Event(Event::HostDisconnected)).await.is_err() {
            return;
        }
        attempt = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    fn kodi_config(port: u16) -> KodiConfig {
        KodiConfig {
            host: "127.0.0.1".into(),
            rpc_port: port,
            eventserver_port: 9777,
        }
    }

    #[test]
    fn notification_request_shape() {
        let n = Notification {
            heading: "Addon screensaver.turnoff failed".into(),
            message: "boom".into(),
            icon: String::new(),
            delay_ms: 10_000,
        };
        let req = notification_request(&n);
        assert_eq!(req["method"], "GUI.ShowNotification");
        assert_eq!(req["params"]["title"], "Addon screensaver.turnoff failed");
        assert_eq!(req["params"]["displaytime"], 10_000);
        assert!(req["params"].get("image").is_none());

        let with_icon = Notification { icon: "/icon.png".into(), ..n };
        assert_eq!(notification_request(&with_icon)["params"]["image"], "/icon.png");
    }

    #[tokio::test]
    async fn rpc_without_connection_is_disconnected() {
        let host = KodiHost::new(&kodi_config(1), &AddonInfo::default());
        assert_eq!(
            host.execute_json_rpc(r#"{"id":1}"#).await,
            Err(HostError::Disconnected)
        );
    }

    #[tokio::test]
    async fn forwards_screensaver_events_and_reports_loss() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(
                br#"{"jsonrpc":"2.0","method":"Player.OnPlay","params":{}}{"jsonrpc":"2.0","method":"GUI.OnScreensaverActivated","params":{}}"#,
            )
            .await
            .unwrap();
        });

        let host = Arc::new(KodiHost::new(&kodi_config(port), &AddonInfo::default()));
        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(run_connection(host.clone(), tx));

        let mut events = Vec::new();
        while events.len() < 3 {
            match rx.recv().await {
                Some(DaemonMsg::Event(e)) => events.push(e),
                other => panic!("unexpected message {other:?}"),
            }
        }
        assert_eq!(
            events,
            vec![Event::HostConnected, Event::ScreensaverActivated, Event::HostDisconnected]
        );

        server.await.unwrap();
        task.abort();
    }
}
