//! remcon - a terminal console for remote command servers.
//!
//! Wires a command input line, a scrolling transcript, and named actions to
//! a remote HTTP console endpoint (`/query/<command>` and
//! `/cmd/?cmd=<name>&val=<value>`).

mod client;
mod config;
mod console;
mod transcript;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::Command as ProcessCommand;
use tracing_subscriber::EnvFilter;

use client::ConsoleClient;

#[derive(Parser)]
#[command(name = "remcon")]
#[command(author, version, about = "Terminal console for remote command servers")]
#[command(
    long_about = "Interactive console over a remote HTTP command endpoint.\n\nWith no arguments, opens the console UI. With a COMMAND argument, sends a single query and prints the response."
)]
struct Cli {
    /// Direct query mode - provide the command as an argument
    #[arg(value_name = "COMMAND")]
    command: Option<String>,

    /// No TUI, just print the response (for scripting)
    #[arg(long)]
    pipe: bool,

    /// Override the configured server base URL
    #[arg(short, long, value_name = "URL")]
    server: Option<String>,

    #[command(subcommand)]
    subcommand: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fire a named action from config and print its status text
    Action {
        /// Action name (e.g., ping)
        name: String,
    },
    /// List configured named actions
    Actions,
    /// Open configuration file in $EDITOR
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.subcommand {
        Some(Commands::Action { name }) => handle_action(&name, cli.server).await,
        Some(Commands::Actions) => handle_actions(),
        Some(Commands::Config) => handle_config(),
        None => handle_console(cli.command, cli.pipe, cli.server).await,
    }
}

/// Initialize logging to stderr (stdout carries query payloads in pipe
/// mode). Not installed for the interactive console, which owns the
/// terminal.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("remcon=info".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load config and apply the CLI server override.
fn load_config(server: Option<String>) -> Result<config::Config> {
    let mut config = config::Config::load().context("Failed to load configuration")?;
    if let Some(url) = server {
        config.server.base_url = url;
    }
    Ok(config)
}

/// Run the console: interactive TUI by default, one-shot query when a
/// command was given on the command line.
async fn handle_console(command: Option<String>, pipe: bool, server: Option<String>) -> Result<()> {
    let config = load_config(server)?;
    let client = ConsoleClient::new(&config.server)?;

    if pipe || command.is_some() {
        init_logging();
        let command = command.ok_or_else(|| anyhow::anyhow!("COMMAND required in --pipe mode"))?;
        match client.query(&command).await {
            Ok(payload) => {
                // Output just the payload to stdout
                println!("{}", payload);
                Ok(())
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        if !atty::is(atty::Stream::Stdout) {
            eprintln!("Interactive console requires a terminal. Use --pipe <COMMAND> for scripting.");
            std::process::exit(1);
        }
        client::tui::run(config, client).await
    }
}

/// Fire a named action and print the returned status text.
async fn handle_action(name: &str, server: Option<String>) -> Result<()> {
    init_logging();
    let config = load_config(server)?;
    let action = config
        .actions
        .get(name)
        .with_context(|| format!("No action named '{}' in config", name))?
        .clone();

    let client = ConsoleClient::new(&config.server)?;
    let payload = client
        .action(&action.cmd, action.val)
        .await
        .with_context(|| format!("Action '{}' failed", name))?;
    println!("{}", payload);
    Ok(())
}

/// List the configured named actions.
fn handle_actions() -> Result<()> {
    let config = config::Config::load()?;

    println!("Configured Actions");
    println!("==================\n");

    for (name, action) in &config.actions {
        println!("  {}\n    cmd: {}\n    val: {}\n", name, action.cmd, action.val);
    }

    println!("Usage:");
    println!("  remcon action ping      # Fire the 'ping' action");
    println!("  Ctrl+P in the console fires 'ping'");

    Ok(())
}

/// Handle the config command.
fn handle_config() -> Result<()> {
    let config_path = config::Config::config_path()?;

    // Ensure config directory exists
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Create default config if it doesn't exist
    if !config_path.exists() {
        let default_config = config::Config::default();
        default_config.save()?;
        println!("Created default config at {}", config_path.display());
    }

    // Open in editor
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}
