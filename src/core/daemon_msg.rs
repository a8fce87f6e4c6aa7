// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::oneshot;

use crate::core::{events::Event, info::InfoSnapshot};

#[derive(Debug)]
pub enum DaemonMsg {
    Event(Event),

    /// Posted by the deactivation monitor.
    Resume,

    /// Run the activation sequence on request rather than on a host event.
    Activate {
        reply: oneshot::Sender<Result<String, String>>,
    },

    Deactivate {
        reply: oneshot::Sender<Result<String, String>>,
    },

    GetInfo {
        reply: oneshot::Sender<InfoSnapshot>,
    },

    StopDaemon {
        reply: oneshot::Sender<Result<String, String>>,
    },
}
