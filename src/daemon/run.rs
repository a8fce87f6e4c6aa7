// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::{mpsc, watch};

use crate::core::{
    daemon_msg::DaemonMsg,
    error::Error,
    host::{CommandRunner, Host},
};
use crate::sinfo;

use super::{Daemon, Flow};

impl<H: Host, R: CommandRunner> Daemon<H, R> {
    /// Serve messages until a stop request, a shutdown signal, or a fatal error.
    pub async fn run(
        &mut self,
        tx: mpsc::Sender<DaemonMsg>,
        mut rx: mpsc::Receiver<DaemonMsg>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), Error> {
        sinfo!(&self.addon.id, "daemon starting");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        sinfo!(&self.addon.id, "daemon stopping (shutdown requested)");
                        break;
                    }
                }

                maybe = rx.recv() => {
                    let Some(msg) = maybe else {
                        sinfo!(&self.addon.id, "daemon stopping (event channel closed)");
                        break;
                    };

                    if self.handle(msg, &tx).await? == Flow::Stop {
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}
