// Author: Dustin Pilgrim
// License: MIT

use std::fmt;

use crate::core::session::Phase;

/// Process exit status of the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// Startup failure, or an external command exited non-zero.
    Failure = 1,
    /// An external command could not be launched at all.
    LaunchFailed = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `display_method` setting does not index the display table.
    UnknownDisplayMethod(usize),

    /// `power_method` setting does not index the power table.
    UnknownPowerMethod(usize),

    /// External command ran but exited with a non-zero status.
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// External command could not be started.
    CommandLaunch { command: String, reason: String },

    /// The host's JSON-RPC channel failed or returned something unparsable.
    Rpc(String),

    /// Settings could not be read at activation.
    Settings(String),

    /// Activation or resume requested in the wrong controller phase.
    InvalidPhase { expected: Phase, actual: Phase },
}

impl Error {
    /// Fatal errors end the daemon; everything else is logged and survived.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::CommandFailed { .. } | Error::CommandLaunch { .. })
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::CommandLaunch { .. } => ExitCode::LaunchFailed,
            _ => ExitCode::Failure,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownDisplayMethod(i) => write!(f, "unknown display method index {i}"),
            Error::UnknownPowerMethod(i) => write!(f, "unknown power method index {i}"),
            Error::CommandFailed { command, code, .. } => match code {
                Some(rc) => write!(f, "running command '{command}' failed with rc={rc}"),
                None => write!(f, "running command '{command}' was killed by a signal"),
            },
            Error::CommandLaunch { command, reason } => {
                write!(f, "exception running '{command}': {reason}")
            }
            Error::Rpc(msg) => write!(f, "json-rpc: {msg}"),
            Error::Settings(msg) => write!(f, "settings: {msg}"),
            Error::InvalidPhase { expected, actual } => {
                write!(f, "session is {actual:?}, expected {expected:?}")
            }
        }
    }
}

impl std::error::Error for Error {}
