//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// procrelay - supervisor event relay
#[derive(Parser)]
#[command(
    name = "procrelay",
    about = "Relays process supervisor events to chat webhooks",
    version,
    after_help = "Logs are written to: ~/.local/share/procrelay/logs/procrelay.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level override
    #[arg(long, global = true, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Relay bus records read as JSON lines from stdin
    Run,

    /// Load and validate the config, then print the effective settings
    CheckConfig,

    /// Send a single test notification
    Test {
        /// Event kind to send as
        #[arg(short, long, default_value = "online")]
        kind: String,

        /// Process name shown in the title
        #[arg(short, long, default_value = "procrelay")]
        process: String,

        /// Notification text
        #[arg(short, long, default_value = "Test notification from procrelay")]
        message: String,
    },
}

/// Path of the log file written by the binary
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("procrelay")
        .join("logs")
        .join("procrelay.log")
}
