// Author: Dustin Pilgrim
// License: MIT

use eyre::Result;

use crate::cli::{Args, Command};
use crate::core::{error::ExitCode, methods};

pub async fn run(args: Args) -> Result<ExitCode> {
    let Some(cmd) = args.command.as_ref() else {
        return Ok(ExitCode::Success);
    };

    let code = match cmd {
        Command::List { json } => {
            if *json {
                println!("{}", methods::tables_json());
            } else {
                print!("{}", methods::format_tables());
            }
            ExitCode::Success
        }

        Command::Activate => send("activate").await,
        Command::Deactivate => send("deactivate").await,
        Command::Stop => send("stop").await,

        Command::Info { json } => send(if *json { "info --json" } else { "info" }).await,
    };

    Ok(code)
}

async fn send(msg: &str) -> ExitCode {
    match crate::ipc::client::request(msg).await {
        Ok(resp) => {
            let out = resp.trim_end();
            match out.strip_prefix("ERROR: ") {
                Some(err) => {
                    eprintln!("turnoff: {err}");
                    ExitCode::Failure
                }
                None => {
                    if !out.is_empty() {
                        println!("{out}");
                    }
                    ExitCode::Success
                }
            }
        }
        Err(e) => {
            eprintln!("turnoff: {e}");
            ExitCode::Failure
        }
    }
}
