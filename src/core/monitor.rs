// Author: Dustin Pilgrim
// License: MIT

use std::fmt;

/// Listens for the end of the screensaver and fires one callback.
pub struct DeactivationMonitor {
    action: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl DeactivationMonitor {
    pub fn new(action: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// Returns `false` if the callback already ran.
    pub fn on_screensaver_deactivated(&mut self) -> bool {
        match self.action.take() {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.action.is_some()
    }
}

impl fmt::Debug for DeactivationMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeactivationMonitor")
            .field("armed", &self.is_armed())
            .finish()
    }
}
