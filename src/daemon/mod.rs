// Author: Dustin Pilgrim
// License: MIT

mod run;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::{self, model::AddonInfo};
use crate::core::{
    daemon_msg::DaemonMsg,
    dispatch::Dispatcher,
    error::Error,
    events::Event,
    host::{CommandRunner, Host},
    info::InfoSnapshot,
    monitor::DeactivationMonitor,
    session::{Controller, Phase},
};
use crate::{sdebug, serror, sinfo, swarn};

/// Whether the message loop keeps going after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Daemon<H, R> {
    controller: Controller,
    host: Arc<H>,
    runner: R,
    addon: AddonInfo,
    config_path: Option<PathBuf>,
    host_connected: bool,
}

impl<H: Host, R: CommandRunner> Daemon<H, R> {
    pub fn new(host: Arc<H>, runner: R, addon: AddonInfo, config_path: Option<PathBuf>) -> Self {
        sdebug!(
            &addon.id,
            "daemon: config_path={}",
            config_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<embedded>".to_string())
        );

        Self {
            controller: Controller::new(),
            host,
            runner,
            addon,
            config_path,
            host_connected: false,
        }
    }

    pub fn snapshot(&self) -> InfoSnapshot {
        InfoSnapshot::capture(
            &self.controller,
            self.host_connected,
            self.config_path.as_ref().map(|p| p.display().to_string()),
        )
    }

    /// Handle one message. `Err` is always fatal.
    pub async fn handle(
        &mut self,
        msg: DaemonMsg,
        tx: &mpsc::Sender<DaemonMsg>,
    ) -> Result<Flow, Error> {
        match msg {
            DaemonMsg::Event(event) => self.handle_event(event, tx).await?,

            DaemonMsg::Resume => {
                if self.controller.resume_pending() {
                    let result = self.end_session().await;
                    let _ = triage(&self.addon.id, result)?;
                } else {
                    sdebug!(&self.addon.id, "resume already handled, ignored");
                }
            }

            DaemonMsg::Activate { reply } => {
                let result = self.start_session(tx).await;
                let outcome = triage(&self.addon.id, result);
                let _ = reply.send(match &outcome {
                    Ok(Ok(())) => Ok("Screensaver session started".to_string()),
                    Ok(Err(e)) => Err(e.clone()),
                    Err(e) => Err(e.to_string()),
                });
                outcome?;
            }

            DaemonMsg::Deactivate { reply } => {
                let out = if self.deliver_deactivation() {
                    Ok("Deactivation delivered".to_string())
                } else {
                    Err("No active session".to_string())
                };
                let _ = reply.send(out);
            }

            DaemonMsg::GetInfo { reply } => {
                let _ = reply.send(self.snapshot());
            }

            DaemonMsg::StopDaemon { reply } => {
                sinfo!(&self.addon.id, "daemon stopping (stop requested via IPC)");
                let _ = reply.send(Ok("Stopping turnoff daemon".to_string()));
                return Ok(Flow::Stop);
            }
        }

        Ok(Flow::Continue)
    }

    async fn handle_event(
        &mut self,
        event: Event,
        tx: &mpsc::Sender<DaemonMsg>,
    ) -> Result<(), Error> {
        sdebug!(&self.addon.id, "incoming: {:?}", event);

        match event {
            Event::ScreensaverActivated => {
                let result = self.start_session(tx).await;
                let _ = triage(&self.addon.id, result)?;
            }
            Event::ScreensaverDeactivated => {
                self.deliver_deactivation();
            }
            Event::HostQuitting => {
                if self.controller.phase() == Phase::Active {
                    sinfo!(&self.addon.id, "Host is quitting, keeping the session for its return");
                } else {
                    sinfo!(&self.addon.id, "Host is quitting");
                }
            }
            Event::HostConnected => self.host_connected = true,
            Event::HostDisconnected => self.host_connected = false,
        }

        Ok(())
    }

    async fn start_session(&mut self, tx: &mpsc::Sender<DaemonMsg>) -> Result<(), Error> {
        // The previous session ended but its Resume is still queued.
        if self.controller.resume_pending() {
            sinfo!(&self.addon.id, "Finishing the previous session before starting a new one");
            let result = self.end_session().await;
            let _ = triage(&self.addon.id, result)?;
        }

        if self.controller.phase() != Phase::Idle {
            return Err(Error::InvalidPhase {
                expected: Phase::Idle,
                actual: self.controller.phase(),
            });
        }

        let d = Dispatcher::new(&*self.host, &self.runner, &self.addon);

        let settings = match config::load_settings(self.config_path.as_deref()) {
            Ok(settings) => settings,
            Err(e) => {
                d.popup(None, &format!("Cannot read settings: {e}"), None).await;
                return Err(Error::Settings(e.to_string()));
            }
        };

        let tx = tx.clone();
        let monitor = DeactivationMonitor::new(move || {
            if let Err(TrySendError::Full(msg)) = tx.try_send(DaemonMsg::Resume) {
                tokio::spawn(async move {
                    let _ = tx.send(msg).await;
                });
            }
        });

        self.controller.activate(&d, &settings, monitor).await
    }

    async fn end_session(&mut self) -> Result<(), Error> {
        let d = Dispatcher::new(&*self.host, &self.runner, &self.addon);
        self.controller.resume(&d).await
    }

    fn deliver_deactivation(&mut self) -> bool {
        if self.controller.notify_deactivated() {
            sinfo!(&self.addon.id, "Screensaver deactivated");
            true
        } else {
            swarn!(&self.addon.id, "Screensaver deactivated without a session, ignored");
            false
        }
    }
}

/// Fatal errors come back as `Err`; the rest are logged and handed back as text.
fn triage(id: &str, result: Result<(), Error>) -> Result<Result<(), String>, Error> {
    match result {
        Ok(()) => Ok(Ok(())),
        Err(e) if e.is_fatal() => {
            serror!(id, "{}, exiting", e);
            Err(e)
        }
        Err(e @ Error::InvalidPhase { .. }) => {
            swarn!(id, "Ignored: {}", e);
            Ok(Err(e.to_string()))
        }
        Err(e) => {
            serror!(id, "{}", e);
            Ok(Err(e.to_string()))
        }
    }
}
