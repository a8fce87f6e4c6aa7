// Author: Dustin Pilgrim
// License: MIT

use std::io;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::process::Command;

use crate::core::host::{CommandOutput, CommandRunner};

/// Runs external commands on the local machine.
///
/// stdout and stderr share one pipe so the captured text keeps the order the
/// process wrote it in. There is no timeout: a hanging command hangs the
/// session that started it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, argv: &[&str]) -> io::Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let (sender, mut receiver) = pipe::pipe()?;
        let writer = sender.into_blocking_fd()?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);

        let mut child = command.spawn()?;

        // Our copies of the write end live in `command`; drop them or the read never ends.
        drop(command);

        let mut buf = Vec::new();
        receiver.read_to_end(&mut buf).await?;
        let status = child.wait().await?;

        Ok(CommandOutput {
            code: status.code(),
            output: String::from_utf8_lossy(&buf).into_owned(),
        })
    }
}
