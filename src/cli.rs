// Author: Dustin Pilgrim
// License: MIT

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "turnoff",
    version = env!("CARGO_PKG_VERSION"),
    about = "Turns the display (and optionally the system) off while Kodi's screensaver runs"
)]
pub struct Args {
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, action)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    #[command(about = "Run the power-off sequence now, as if the screensaver started")]
    Activate,

    #[command(about = "Deliver a screensaver deactivation to the running session")]
    Deactivate,

    #[command(about = "Display current session information")]
    Info {
        #[arg(long)]
        json: bool,
    },

    #[command(about = "List the display and power methods with their indices")]
    List {
        #[arg(long)]
        json: bool,
    },

    #[command(about = "Stop the running turnoff daemon")]
    Stop,
}
