// Author: Dustin Pilgrim
// License: MIT

use serde_json::{Map, Value, json};

use crate::config::model::AddonInfo;
use crate::core::action::Action;
use crate::core::error::Error;
use crate::core::host::{CommandRunner, Host, Notification};
use crate::{sdebug, serror, sinfo, swarn};

/// Build a JSON-RPC request object for `method`; `id` and `jsonrpc` are filled in on send.
pub fn request(method: &str, params: Option<Value>) -> Map<String, Value> {
    let mut req = Map::new();
    req.insert("method".into(), Value::from(method));
    if let Some(params) = params {
        req.insert("params".into(), params);
    }
    req
}

/// The primitives table rows resolve to, bound to one host and one command runner.
pub struct Dispatcher<'a, H, R> {
    host: &'a H,
    runner: &'a R,
    addon: &'a AddonInfo,
}

impl<'a, H: Host, R: CommandRunner> Dispatcher<'a, H, R> {
    pub fn new(host: &'a H, runner: &'a R, addon: &'a AddonInfo) -> Self {
        Self { host, runner, addon }
    }

    pub fn addon(&self) -> &AddonInfo {
        self.addon
    }

    /// Fire one table action. Only external commands can fail fatally;
    /// RPC error responses do not fail the action.
    pub async fn invoke(&self, action: &Action) -> Result<(), Error> {
        match *action {
            Action::Log(message) => {
                self.log(message);
                Ok(())
            }
            Action::Builtin(builtin) => {
                self.run_builtin(builtin).await;
                Ok(())
            }
            Action::Command(argv) => self.run_command(argv).await,
            Action::Rpc(method) => self.jsonrpc(request(method, None)).await.map(|_| ()),
        }
    }

    pub fn log(&self, message: &str) {
        sinfo!(&self.addon.id, "{}", message);
    }

    /// Failures are reported (log + pop-up) and swallowed.
    pub async fn run_builtin(&self, builtin: &str) {
        sinfo!(&self.addon.id, "Executing builtin '{}'", builtin);

        if let Err(e) = self.host.execute_builtin(builtin).await {
            serror!(&self.addon.id, "Exception executing builtin '{}': {}", builtin, e);
            self.popup(None, &format!("Exception executing builtin '{builtin}': {e}"), None)
                .await;
        }
    }

    /// Blocks until the process exits. Any failure is fatal for the daemon:
    /// the caller gets an error carrying the exit code to terminate with.
    pub async fn run_command(&self, argv: &[&str]) -> Result<(), Error> {
        let command = argv.join(" ");
        let program = argv.first().copied().unwrap_or_default();

        match self.runner.run(argv).await {
            Ok(out) if out.success() => {
                sinfo!(&self.addon.id, "Running command '{}' returned rc=0", command);
                Ok(())
            }
            Ok(out) => {
                let rc = out
                    .code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                serror!(&self.addon.id, "Running command '{}' failed with rc={}", command, rc);
                if !out.output.is_empty() {
                    serror!(
                        &self.addon.id,
                        "Command '{}' returned: {}",
                        program,
                        out.output.trim_end()
                    );
                }

                let err = Error::CommandFailed {
                    command,
                    code: out.code,
                    output: out.output,
                };

                let message = match &err {
                    Error::CommandFailed { output, .. } if !output.trim().is_empty() => {
                        output.trim_end().to_string()
                    }
                    other => other.to_string(),
                };
                self.popup(None, &message, None).await;

                Err(err)
            }
            Err(e) => {
                serror!(&self.addon.id, "Exception running '{}': {}", program, e);
                self.popup(None, &format!("Exception running '{program}': {e}"), None)
                    .await;

                Err(Error::CommandLaunch {
                    command: program.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Send a JSON-RPC 2.0 request, filling in `id` and `jsonrpc` when absent.
    /// The decoded response is returned as-is, error member included.
    pub async fn jsonrpc(&self, mut request: Map<String, Value>) -> Result<Value, Error> {
        request.entry("id").or_insert(Value::from(1));
        request.entry("jsonrpc").or_insert(Value::from("2.0"));

        let payload = Value::Object(request);
        let method = payload["method"].as_str().unwrap_or("<none>").to_string();

        let raw = self
            .host
            .execute_json_rpc(&payload.to_string())
            .await
            .map_err(|e| Error::Rpc(format!("{method}: {e}")))?;

        let result: Value = serde_json::from_str(&raw)
            .map_err(|e| Error::Rpc(format!("{method}: undecodable response: {e}")))?;

        sdebug!(
            &self.addon.id,
            "Sending JSON-RPC payload: '{}' returns '{}'",
            payload,
            result
        );

        if let Some(err) = result.get("error") {
            swarn!(&self.addon.id, "JSON-RPC {} answered with an error: {}", method, err);
        }

        Ok(result)
    }

    /// Show a pop-up. Heading defaults to "Addon <id> failed", icon to the addon icon.
    pub async fn popup(&self, heading: Option<&str>, message: &str, icon: Option<&str>) {
        let heading = heading
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Addon {} failed", self.addon.id));

        let icon = icon
            .filter(|i| !i.is_empty())
            .unwrap_or(self.addon.icon.as_str())
            .to_string();

        let notification = Notification {
            heading,
            message: message.to_string(),
            icon,
            delay_ms: self.addon.notification_ms,
        };

        if let Err(e) = self.host.notify(&notification).await {
            swarn!(&self.addon.id, "failed to show notification: {}", e);
        }
    }

    pub async fn set_mute(&self, mute: bool) -> Result<Value, Error> {
        self.jsonrpc(request("Application.SetMute", Some(json!({ "mute": mute }))))
            .await
    }

    pub async fn activate_window(&self, window: &str) -> Result<Value, Error> {
        self.jsonrpc(request(
            "GUI.ActivateWindow",
            Some(json!({ "window": window, "parameters": [] })),
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::HostError;
    use crate::core::testing::{Call, FakeHost, FakeRunner, addon, recorder};

    #[tokio::test]
    async fn jsonrpc_fills_id_and_version() {
        let calls = recorder();
        let host = FakeHost::new(calls.clone());
        let runner = FakeRunner::exiting(calls.clone(), 0, "");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        let result = d.jsonrpc(request("System.Suspend", None)).await.unwrap();

        assert_eq!(
            calls.take(),
            vec![Call::Rpc(json!({"id": 1, "jsonrpc": "2.0", "method": "System.Suspend"}))]
        );
        assert_eq!(result, serde_json::from_str::<Value>(&host.response).unwrap());
    }

    #[tokio::test]
    async fn jsonrpc_keeps_explicit_id_and_version() {
        let calls = recorder();
        let host = FakeHost::new(calls.clone());
        let runner = FakeRunner::exiting(calls.clone(), 0, "");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        let mut req = request("JSONRPC.Ping", None);
        req.insert("id".into(), json!("ping"));
        req.insert("jsonrpc".into(), json!("2.0"));
        d.jsonrpc(req).await.unwrap();

        assert_eq!(
            calls.take(),
            vec![Call::Rpc(json!({"id": "ping", "jsonrpc": "2.0", "method": "JSONRPC.Ping"}))]
        );
    }

    #[tokio::test]
    async fn jsonrpc_returns_error_responses_unmodified() {
        let calls = recorder();
        let mut host = FakeHost::new(calls.clone());
        host.response = r#"{"error":{"code":-32601,"message":"Method not found."},"id":1,"jsonrpc":"2.0"}"#.into();
        let runner = FakeRunner::exiting(calls.clone(), 0, "");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        let result = d.jsonrpc(request("Nope.Nope", None)).await.unwrap();
        assert_eq!(result["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn jsonrpc_transport_failure_is_not_fatal() {
        let calls = recorder();
        let mut host = FakeHost::new(calls.clone());
        host.rpc_error = Some(HostError::Disconnected);
        let runner = FakeRunner::exiting(calls.clone(), 0, "");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        let err = d.jsonrpc(request("System.Suspend", None)).await.unwrap_err();
        assert!(matches!(err, Error::Rpc(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn successful_command_is_silent() {
        let calls = recorder();
        let host = FakeHost::new(calls.clone());
        let runner = FakeRunner::exiting(calls.clone(), 0, "ok\n");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        d.run_command(&["vcgencmd", "display_power", "0"]).await.unwrap();

        assert_eq!(calls.take(), vec![Call::command(&["vcgencmd", "display_power", "0"])]);
    }

    #[tokio::test]
    async fn failing_command_notifies_once_and_exits_1() {
        let calls = recorder();
        let host = FakeHost::new(calls.clone());
        let runner = FakeRunner::exiting(calls.clone(), 1, "no display attached\n");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        let err = d.run_command(&["tvservice", "-o"]).await.unwrap_err();
        assert_eq!(err.exit_code() as u8, 1);

        let calls = calls.take();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::command(&["tvservice", "-o"]));
        match &calls[1] {
            Call::Notify(n) => {
                assert_eq!(n.heading, "Addon screensaver.turnoff failed");
                assert_eq!(n.message, "no display attached");
                assert_eq!(n.icon, addon.icon);
                assert_eq!(n.delay_ms, 10_000);
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unlaunchable_command_exits_2() {
        let calls = recorder();
        let host = FakeHost::new(calls.clone());
        let runner = FakeRunner::unlaunchable(calls.clone());
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        let err = d.run_command(&["vbetool", "dpms", "off"]).await.unwrap_err();
        assert_eq!(err.exit_code() as u8, 2);

        let notifications = calls
            .take()
            .into_iter()
            .filter(|c| matches!(c, Call::Notify(_)))
            .count();
        assert_eq!(notifications, 1);
    }

    #[tokio::test]
    async fn builtin_failure_is_swallowed_after_popup() {
        let calls = recorder();
        let mut host = FakeHost::new(calls.clone());
        host.builtin_error = Some(HostError::Io("refused".into()));
        let runner = FakeRunner::exiting(calls.clone(), 0, "");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        d.invoke(&Action::Builtin("CECStandby")).await.unwrap();

        let calls = calls.take();
        assert_eq!(calls[0], Call::Builtin("CECStandby".into()));
        assert!(matches!(&calls[1], Call::Notify(n) if n.message.contains("CECStandby")));
    }

    #[tokio::test]
    async fn log_action_has_no_side_effect() {
        let calls = recorder();
        let host = FakeHost::new(calls.clone());
        let runner = FakeRunner::exiting(calls.clone(), 0, "");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        d.invoke(&Action::Log("Do nothing to power off display")).await.unwrap();

        assert!(calls.take().is_empty());
    }

    #[tokio::test]
    async fn popup_uses_explicit_heading_and_icon() {
        let calls = recorder();
        let host = FakeHost::new(calls.clone());
        let runner = FakeRunner::exiting(calls.clone(), 0, "");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        d.popup(Some("Heads up"), "display off", Some("/tmp/x.png")).await;

        assert_eq!(
            calls.take(),
            vec![Call::Notify(Notification {
                heading: "Heads up".into(),
                message: "display off".into(),
                icon: "/tmp/x.png".into(),
                delay_ms: 10_000,
            })]
        );
    }

    #[tokio::test]
    async fn mute_and_window_use_fixed_methods() {
        let calls = recorder();
        let host = FakeHost::new(calls.clone());
        let runner = FakeRunner::exiting(calls.clone(), 0, "");
        let addon = addon();
        let d = Dispatcher::new(&host, &runner, &addon);

        d.set_mute(true).await.unwrap();
        d.activate_window("loginscreen").await.unwrap();

        assert_eq!(
            calls.take(),
            vec![
                Call::Rpc(json!({
                    "id": 1, "jsonrpc": "2.0",
                    "method": "Application.SetMute", "params": {"mute": true}
                })),
                Call::Rpc(json!({
                    "id": 1, "jsonrpc": "2.0",
                    "method": "GUI.ActivateWindow",
                    "params": {"window": "loginscreen", "parameters": []}
                })),
            ]
        );
    }
}
