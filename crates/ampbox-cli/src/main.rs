//! Ampbox CLI
//!
//! Runs Amplifier sessions on Ampbox sandbox infrastructure.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use ampbox_cli::cli::{Cli, Command};
use ampbox_cli::config::CliConfig;
use ampbox_cli::config_cmd;
use ampbox_cli::runner::{Console, Runner, ctrl_c};
use ampbox_client::HttpSessionClient;
use ampbox_client::tracing_init::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing("warn", cli.log_json);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting ampbox CLI");

    let mut config = CliConfig::load();
    let mut console = Console::stdio();

    let outcome = match cli.command {
        Command::Config { action } => {
            let path = CliConfig::config_path()
                .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
            config_cmd::run(action, &mut config, &path, &mut io::stdout())?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Run { prompt, bundle } => {
            let runner = connect(&config, cli.url, cli.key)?;
            let cwd = std::env::current_dir()?;
            let bundle = config.bundle(bundle);
            runner
                .run(&mut console, &prompt, &bundle, &cwd, ctrl_c())
                .await?
        }
        Command::Resume { session_id } => {
            let runner = connect(&config, cli.url, cli.key)?;
            runner
                .resume(&mut console, &session_id, ctrl_c())
                .await?
        }
        Command::List => {
            let runner = connect(&config, cli.url, cli.key)?;
            runner.list(&mut console).await?
        }
    };

    Ok(outcome.exit_code())
}

/// Build the session client from flags, environment, and stored config.
fn connect(
    config: &CliConfig,
    url: Option<String>,
    key: Option<String>,
) -> anyhow::Result<Runner<HttpSessionClient>> {
    let client = HttpSessionClient::new(&config.client_config(url, key)?)?;
    Ok(Runner::new(client))
}
