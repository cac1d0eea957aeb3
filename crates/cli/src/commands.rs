// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gstmgrctl` subcommands. One variant per bus method, plus `daemon`
//! for foreground/background process lifecycle.

use crate::client::{self, Daemon1Proxy};
use crate::error::CliError;
use clap::{Args, Subcommand};
use gst_manager_core::AutoConfig;
use serde_json::Value;

#[derive(Subcommand)]
pub enum Command {
    /// Manage the daemon process itself
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
    /// List all instances
    List,
    /// Create a new instance
    Create { name: String, pipeline: String },
    /// Delete an instance (must not be running)
    Delete { id: String },
    /// Start an instance
    Start { id: String },
    /// Stop an instance
    Stop { id: String },
    /// Show an instance's runtime status
    Status { id: String },
    /// Replace an instance's pipeline text (must not be running)
    UpdatePipeline { id: String, pipeline: String },
    /// Show the last N lines of an instance's captured stderr
    Logs {
        id: String,
        #[arg(short = 'n', long, default_value_t = 100)]
        lines: u32,
    },
    /// Clear an instance's captured stderr
    ClearLogs { id: String },
    /// Show discovered video/audio/encoder capabilities
    BoardContext,
    /// Show current HDMI input (RX) status
    HdmiStatus,
    /// Show the composite passthrough (capture-ready) state
    PassthroughState,
    /// Set an instance's autostart flag and trigger event
    Autostart {
        id: String,
        #[arg(long)]
        enabled: bool,
        /// One of: boot, hdmi_signal_ready, hdmi_passthrough_ready
        #[arg(long, default_value = "")]
        trigger: String,
    },
    /// Manage the singleton auto-managed HDMI capture instance
    Auto {
        #[command(subcommand)]
        command: AutoCommand,
    },
    /// Export an instance's current record as text
    Export { id: String },
    /// Import an instance record, producing a (possibly new) id
    Import { text: String },
    /// Ask the generation agent to produce a pipeline from a prompt
    AiGenerate { prompt: String },
    /// Ask the generation agent to repair a pipeline given its stderr tail
    AiFix { pipeline: String, stderr_tail: String },
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Run gst-managerd in the foreground, replacing this process
    Start {
        #[arg(long)]
        foreground: bool,
    },
    /// Check whether the daemon is reachable on the bus
    Status,
}

#[derive(Subcommand)]
pub enum AutoCommand {
    /// Show the current (or default) auto-instance configuration
    Get,
    /// Replace the auto-instance configuration (JSON `AutoConfig`)
    Set { config: String },
    /// Render the pipeline a given configuration would produce
    Preview { config: String },
    /// Stop and delete the auto-managed instance
    Delete,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Emit raw JSON instead of a human-readable summary
    #[arg(long, global = true)]
    pub json: bool,
}

fn print_json_or(json: bool, raw: &str, pretty: impl FnOnce(&Value)) {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) if json => println!("{}", serde_json::to_string_pretty(&value).unwrap_or(raw.to_string())),
        Ok(value) => pretty(&value),
        Err(_) => println!("{raw}"),
    }
}

pub async fn dispatch(command: Command, global: GlobalArgs) -> Result<(), CliError> {
    let Command::Daemon { command: daemon_command } = command else {
        return dispatch_bus_command(command, global).await;
    };
    run_daemon_command(daemon_command).await
}

async fn dispatch_bus_command(command: Command, global: GlobalArgs) -> Result<(), CliError> {
    let proxy = client::connect().await.map_err(CliError::Connect)?;

    match command {
        Command::Daemon { .. } => Err(CliError::Usage("internal: daemon command routed to bus dispatch".to_string()))?,
        Command::List => {
            let raw = proxy.list_instances().await?;
            print_json_or(global.json, &raw, |v| println!("{}", serde_json::to_string_pretty(v).unwrap_or_default()));
        }
        Command::Create { name, pipeline } => {
            let id = proxy.create_instance(&name, &pipeline).await?;
            println!("{id}");
        }
        Command::Delete { id } => {
            proxy.delete_instance(&id).await?;
            println!("deleted {id}");
        }
        Command::Start { id } => {
            proxy.start_instance(&id).await?;
            println!("started {id}");
        }
        Command::Stop { id } => {
            proxy.stop_instance(&id).await?;
            println!("stopped {id}");
        }
        Command::Status { id } => {
            let raw = proxy.get_instance_status(&id).await?;
            print_json_or(global.json, &raw, |v| println!("{}", serde_json::to_string_pretty(v).unwrap_or_default()));
        }
        Command::UpdatePipeline { id, pipeline } => {
            proxy.update_pipeline(&id, &pipeline).await?;
            println!("updated {id}");
        }
        Command::Logs { id, lines } => {
            let logs = proxy.get_instance_logs(&id, lines).await?;
            for line in logs {
                println!("{line}");
            }
        }
        Command::ClearLogs { id } => {
            proxy.clear_instance_logs(&id).await?;
            println!("cleared logs for {id}");
        }
        Command::BoardContext => {
            let raw = proxy.get_board_context().await?;
            print_json_or(global.json, &raw, |v| println!("{}", serde_json::to_string_pretty(v).unwrap_or_default()));
        }
        Command::HdmiStatus => {
            let raw = proxy.get_hdmi_status().await?;
            print_json_or(global.json, &raw, |v| println!("{}", serde_json::to_string_pretty(v).unwrap_or_default()));
        }
        Command::PassthroughState => {
            let raw = proxy.get_passthrough_state().await?;
            print_json_or(global.json, &raw, |v| println!("{}", serde_json::to_string_pretty(v).unwrap_or_default()));
        }
        Command::Autostart { id, enabled, trigger } => {
            proxy.set_instance_autostart(&id, enabled, &trigger).await?;
            println!("autostart updated for {id}");
        }
        Command::Auto { command } => run_auto_command(&proxy, command, global.json).await?,
        Command::Export { id } => {
            let text = proxy.export_instance(&id).await?;
            println!("{text}");
        }
        Command::Import { text } => {
            let id = proxy.import_instance(&text).await?;
            println!("{id}");
        }
        Command::AiGenerate { prompt } => {
            let pipeline = proxy.ai_generate_pipeline(&prompt).await?;
            println!("{pipeline}");
        }
        Command::AiFix { pipeline, stderr_tail } => {
            let fixed = proxy.ai_fix_error(&pipeline, &stderr_tail).await?;
            println!("{fixed}");
        }
    }

    Ok(())
}

/// Parse and range-check an `AutoConfig` payload client-side before it
/// ever reaches the bus, so malformed input fails fast with a local
/// error instead of a round trip.
fn validate_auto_config(config: &str) -> Result<(), CliError> {
    let parsed: AutoConfig = serde_json::from_str(config)?;
    parsed.validate().map_err(|field| CliError::Usage(format!("invalid auto-config field: {field}")))?;
    Ok(())
}

async fn run_auto_command(proxy: &Daemon1Proxy<'static>, command: AutoCommand, json: bool) -> Result<(), CliError> {
    match command {
        AutoCommand::Get => {
            let raw = proxy.get_auto_instance_config().await?;
            print_json_or(json, &raw, |v| println!("{}", serde_json::to_string_pretty(v).unwrap_or_default()));
        }
        AutoCommand::Set { config } => {
            validate_auto_config(&config)?;
            proxy.set_auto_instance_config(&config).await?;
            println!("auto-instance config updated");
        }
        AutoCommand::Preview { config } => {
            validate_auto_config(&config)?;
            let preview = proxy.get_auto_instance_pipeline_preview(&config).await?;
            println!("{preview}");
        }
        AutoCommand::Delete => {
            proxy.delete_auto_instance().await?;
            println!("auto-instance deleted");
        }
    }
    Ok(())
}

async fn run_daemon_command(command: DaemonCommand) -> Result<(), CliError> {
    match command {
        DaemonCommand::Start { foreground } => {
            if !foreground {
                return Err(CliError::Usage(
                    "background daemonization is not implemented; run with --foreground".to_string(),
                ));
            }
            let status = std::process::Command::new("gst-managerd").arg("--foreground").status();
            match status {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(CliError::Usage(format!("gst-managerd exited with {status}"))),
                Err(e) => Err(CliError::Usage(format!("failed to launch gst-managerd: {e}"))),
            }
        }
        DaemonCommand::Status => match client::connect().await {
            Ok(proxy) => {
                let _ = proxy.get_hdmi_status().await?;
                println!("daemon is running ({})", client::BUS_NAME);
                Ok(())
            }
            Err(e) => {
                println!("daemon is not reachable: {e}");
                Ok(())
            }
        },
    }
}
