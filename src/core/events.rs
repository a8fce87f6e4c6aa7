// Author: Dustin Pilgrim
// License: MIT

/// Things the daemon reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ScreensaverActivated,
    ScreensaverDeactivated,

    /// The host is going away (quit, shutdown, reboot).
    HostQuitting,

    HostConnected,
    HostDisconnected,
}

impl Event {
    /// Map a host JSON-RPC notification method onto an event we care about.
    pub fn from_notification(method: &str) -> Option<Self> {
        match method {
            "GUI.OnScreensaverActivated" => Some(Event::ScreensaverActivated),
            "GUI.OnScreensaverDeactivated" => Some(Event::ScreensaverDeactivated),
            "System.OnQuit" | "System.OnRestart" => Some(Event::HostQuitting),
            _ => None,
        }
    }
}
