// Author: Dustin Pilgrim
// License: MIT

pub mod eventserver;
pub mod jsonrpc;
pub mod kodi;
pub mod process;
