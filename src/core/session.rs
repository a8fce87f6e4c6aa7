// Author: Dustin Pilgrim
// License: MIT

use crate::config::model::Settings;
use crate::core::dispatch::Dispatcher;
use crate::core::error::Error;
use crate::core::host::{CommandRunner, Host};
use crate::core::methods::{self, DisplayMethod, PowerMethod};
use crate::core::monitor::DeactivationMonitor;
use crate::{sinfo, swarn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Activating,
    Active,
    Resuming,
}

/// Everything one screensaver session needs to undo what it did.
#[derive(Debug)]
pub struct Session {
    pub display: &'static DisplayMethod,
    pub power: &'static PowerMethod,
    pub mute: bool,
    monitor: DeactivationMonitor,
}

/// Drives the power-off sequence when the screensaver starts and the
/// power-on sequence when it ends. At most one session exists at a time.
#[derive(Debug)]
pub struct Controller {
    phase: Phase,
    session: Option<Session>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            session: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Order: display off, logoff, mute, register monitor, power off.
    ///
    /// The power action may take the host (or the machine) down with it;
    /// nothing after it is required for the session to be resumable.
    pub async fn activate<H: Host, R: CommandRunner>(
        &mut self,
        d: &Dispatcher<'_, H, R>,
        settings: &Settings,
        monitor: DeactivationMonitor,
    ) -> Result<(), Error> {
        if self.phase != Phase::Idle {
            return Err(Error::InvalidPhase {
                expected: Phase::Idle,
                actual: self.phase,
            });
        }

        self.phase = Phase::Activating;

        match self.power_off(d, settings, monitor).await {
            Ok(()) => {
                self.phase = Phase::Active;
                Ok(())
            }
            Err(e) => {
                self.session = None;
                self.phase = Phase::Idle;
                Err(e)
            }
        }
    }

    async fn power_off<H: Host, R: CommandRunner>(
        &mut self,
        d: &Dispatcher<'_, H, R>,
        settings: &Settings,
        monitor: DeactivationMonitor,
    ) -> Result<(), Error> {
        let id = &d.addon().id;

        let display = methods::display_method(settings.display_method)?;
        let power = methods::power_method(settings.power_method)?;

        sinfo!(
            id,
            "display_method={}, power_method={}, logoff={}, mute={}",
            display.name,
            power.name,
            settings.logoff,
            settings.mute
        );

        if !display.is_noop() {
            sinfo!(id, "Turn display signal off using method '{}'", display.name);
        }
        d.invoke(&display.off).await?;

        if settings.logoff {
            sinfo!(id, "Log off user");
            survive(id, d.activate_window("loginscreen").await)?;
        }

        if settings.mute {
            sinfo!(id, "Mute audio");
            survive(id, d.set_mute(true).await)?;
        }

        self.session = Some(Session {
            display,
            power,
            mute: settings.mute,
            monitor,
        });

        if !power.is_noop() {
            sinfo!(id, "Turn system off using method '{}'", power.name);
        }
        survive(id, d.invoke(&power.off).await)?;

        Ok(())
    }

    /// Deliver the host's "screensaver deactivated" event to the registered
    /// monitor. Returns whether a monitor fired.
    pub fn notify_deactivated(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => session.monitor.on_screensaver_deactivated(),
            None => false,
        }
    }

    /// The monitor of the current session has fired but the display has not
    /// been turned back on yet.
    pub fn resume_pending(&self) -> bool {
        self.phase == Phase::Active
            && self
                .session
                .as_ref()
                .is_some_and(|session| !session.monitor.is_armed())
    }

    /// Order: unmute, display on, release monitor and close the session.
    pub async fn resume<H: Host, R: CommandRunner>(
        &mut self,
        d: &Dispatcher<'_, H, R>,
    ) -> Result<(), Error> {
        let session = match (self.phase, self.session.take()) {
            (Phase::Active, Some(session)) => session,
            (phase, session) => {
                self.session = session;
                return Err(Error::InvalidPhase {
                    expected: Phase::Active,
                    actual: phase,
                });
            }
        };

        self.phase = Phase::Resuming;
        let result = Self::power_on(d, &session).await;

        // Dropping the session releases the monitor.
        drop(session);
        self.phase = Phase::Idle;

        result
    }

    async fn power_on<H: Host, R: CommandRunner>(
        d: &Dispatcher<'_, H, R>,
        session: &Session,
    ) -> Result<(), Error> {
        let id = &d.addon().id;

        if session.mute {
            sinfo!(id, "Unmute audio");
            survive(id, d.set_mute(false).await)?;
        }

        if !session.display.is_noop() {
            sinfo!(
                id,
                "Turn display signal back on using method '{}'",
                session.display.name
            );
        }
        d.invoke(&session.display.on).await
    }
}

/// Non-fatal failures are logged and the sequence goes on.
fn survive<T>(id: &str, result: Result<T, Error>) -> Result<(), Error> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            swarn!(id, "{}", e);
            Ok(())
        }
    }
}
