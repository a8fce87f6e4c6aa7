// Author: Dustin Pilgrim
// License: MIT

pub mod action;
pub mod daemon_msg;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod host;
pub mod info;
pub mod methods;
pub mod monitor;
pub mod session;

#[cfg(test)]
pub mod testing;
