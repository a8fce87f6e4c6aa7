// Author: Dustin Pilgrim
// License: MIT

mod app;
mod cli;
mod config;
mod core;
mod daemon;
mod ipc;
mod log;
mod services;

use clap::Parser;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = cli::Args::parse();

    let result = if args.command.is_some() {
        app::command::run(args).await
    } else {
        app::daemon_mode::run(args).await
    };

    match result {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("turnoff: {e:?}");
            crate::core::error::ExitCode::Failure.into()
        }
    }
}
