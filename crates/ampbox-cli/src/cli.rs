//! Command-line definition.

use clap::{Parser, Subcommand};

use crate::config_cmd::ConfigAction;

#[derive(Parser, Debug)]
#[command(name = "ampbox")]
#[command(version, about = "Run Amplifier sessions in Ampbox sandboxes", long_about = None)]
pub struct Cli {
    /// Ampbox service URL
    #[arg(long, global = true, env = "AMPBOX_URL")]
    pub url: Option<String>,

    /// Ampbox API key
    #[arg(long, global = true, env = "AMPBOX_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a remote session in the current directory and stream its events
    Run {
        /// Initial prompt for the session
        prompt: String,
        /// Bundle to use (defaults to foundation:default)
        #[arg(short, long)]
        bundle: Option<String>,
    },
    /// Resume a paused session
    Resume {
        /// Session ID
        session_id: String,
    },
    /// List your sessions
    List,
    /// Manage stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}
