// Author: Dustin Pilgrim
// License: MIT

//! Recording fakes for the host and the command runner.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::config::model::AddonInfo;
use crate::core::host::{CommandOutput, CommandRunner, Host, HostError, Notification};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Builtin(String),
    Rpc(Value),
    Notify(Notification),
    Command(Vec<String>),
}

impl Call {
    pub fn command(argv: &[&str]) -> Self {
        Call::Command(argv.iter().map(|s| s.to_string()).collect())
    }

    pub fn rpc_method(&self) -> Option<&str> {
        match self {
            Call::Rpc(v) => v["method"].as_str(),
            _ => None,
        }
    }
}

/// Call log shared by a host and a runner so ordering across both is kept.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Call>>>);

impl Recorder {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

pub fn recorder() -> Recorder {
    Recorder::default()
}

pub fn addon() -> AddonInfo {
    AddonInfo {
        id: "screensaver.turnoff".into(),
        name: "Turn Off".into(),
        icon: "/usr/share/turnoff/icon.png".into(),
        notification_ms: 10_000,
    }
}

pub struct FakeHost {
    calls: Recorder,
    pub response: String,
    pub builtin_error: Option<HostError>,
    pub rpc_error: Option<HostError>,
}

impl FakeHost {
    pub fn new(calls: Recorder) -> Self {
        Self {
            calls,
            response: r#"{"id":1,"jsonrpc":"2.0","result":"OK"}"#.into(),
            builtin_error: None,
            rpc_error: None,
        }
    }
}

impl Host for FakeHost {
    async fn execute_builtin(&self, command: &str) -> Result<(), HostError> {
        self.calls.push(Call::Builtin(command.to_string()));
        match &self.builtin_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn execute_json_rpc(&self, payload: &str) -> Result<String, HostError> {
        self.calls.push(Call::Rpc(serde_json::from_str(payload).unwrap()));
        match &self.rpc_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.response.clone()),
        }
    }

    async fn notify(&self, notification: &Notification) -> Result<(), HostError> {
        self.calls.push(Call::Notify(notification.clone()));
        Ok(())
    }
}

/// Replies with its outcomes in order. The last one repeats once the list
/// runs out. `None` means the program could not be launched.
pub struct FakeRunner {
    calls: Recorder,
    outcomes: Vec<Option<CommandOutput>>,
    next: AtomicUsize,
}

fn exit(code: i32, output: &str) -> Option<CommandOutput> {
    Some(CommandOutput {
        code: Some(code),
        output: output.to_string(),
    })
}

impl FakeRunner {
    pub fn exiting(calls: Recorder, code: i32, output: &str) -> Self {
        Self::scripted(calls, &[(code, output)])
    }

    pub fn unlaunchable(calls: Recorder) -> Self {
        Self {
            calls,
            outcomes: vec![None],
            next: AtomicUsize::new(0),
        }
    }

    pub fn scripted(calls: Recorder, exits: &[(i32, &str)]) -> Self {
        Self {
            calls,
            outcomes: exits.iter().map(|(code, output)| exit(*code, output)).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, argv: &[&str]) -> io::Result<CommandOutput> {
        self.calls.push(Call::command(argv));
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .outcomes
            .get(n)
            .or(self.outcomes.last())
            .cloned()
            .flatten();
        outcome.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "No such file or directory"))
    }
}
