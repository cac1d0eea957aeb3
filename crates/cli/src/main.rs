// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gstmgrctl`: command-line client for `gst-managerd`, talking to the
//! `org.gstmanager.Daemon1` bus surface.

mod client;
mod color;
mod commands;
mod error;
mod exit_error;

use clap::Parser;
use commands::{Command, GlobalArgs};
use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "gstmgrctl", version, about = "Control gst-managerd", styles = color::styles())]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("gstmgrctl: failed to start async runtime: {e}");
            return std::process::ExitCode::from(1);
        }
    };

    match runtime.block_on(commands::dispatch(cli.command, cli.global)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            let exit = ExitError::new(e.exit_code(), e.to_string());
            eprintln!("gstmgrctl: {}", exit.message);
            std::process::ExitCode::from(exit.code as u8)
        }
    }
}
