// Author: Dustin Pilgrim
// License: MIT

use std::fmt;

/// What a row of the action tables does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing happens besides a log line.
    Log(&'static str),

    /// Opaque built-in command interpreted by the host (e.g. `CECStandby`).
    Builtin(&'static str),

    /// External program; the first element is the executable.
    Command(&'static [&'static str]),

    /// Parameterless JSON-RPC method on the host (e.g. `System.Suspend`).
    Rpc(&'static str),
}

impl Action {
    /// Whether firing this action touches anything outside the log.
    pub fn has_side_effect(&self) -> bool {
        !matches!(self, Action::Log(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Log(msg) => write!(f, "log: {msg}"),
            Action::Builtin(name) => write!(f, "builtin: {name}"),
            Action::Command(argv) => write!(f, "run: {}", argv.join(" ")),
            Action::Rpc(method) => write!(f, "jsonrpc: {method}"),
        }
    }
}
