// Author: Dustin Pilgrim
// License: MIT

use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

fn lock_path() -> Result<PathBuf, String> {
    crate::ipc::runtime_dir()
        .map(|dir| dir.join("turnoff").join("turnoff.lock"))
        .map_err(|e| format!("{e} (cannot create instance lock)"))
}

pub fn acquire_single_instance_lock() -> Result<UnixListener, String> {
    acquire_lock_at(&lock_path()?)
}

/// Binding a socket doubles as a lock: a live holder accepts connections,
/// a stale file left by a crashed daemon does not.
fn acquire_lock_at(path: &Path) -> Result<UnixListener, String> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match UnixListener::bind(path) {
        Ok(l) => Ok(l),
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => match UnixStream::connect(path) {
            Ok(_) => Err(format!(
                "turnoff is already running (another instance holds {})",
                path.display()
            )),
            Err(_) => {
                let _ = std::fs::remove_file(path);
                UnixListener::bind(path)
                    .map_err(|e| format!("failed to bind instance lock {}: {e}", path.display()))
            }
        },
        Err(e) => Err(format!("failed to bind instance lock {}: {e}", path.display())),
    }
}
