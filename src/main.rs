//! # Main Entry Point
//!
//! Initializes the application:
//! - Domain: Configuration and Types
//! - Infrastructure: Workspace Guard, Process, Installer, Settings
//! - Application: Executor, Workspace Tools
//! - Interface: Command Handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use crate::application::executor::ClaudeExecutor;
use crate::application::workspace_tools::WorkspaceTools;
use crate::domain::config::BridgeConfig;
use crate::infrastructure::workspace::WorkspaceGuard;
use crate::interface::commands::{self, ExecAction};
use crate::interface::sink::StdoutSink;

#[derive(Parser)]
#[command(name = "claude-bridge", about = "Claude Code CLI as a callable tool")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "data/config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the CLI, apply settings and install skills
    Setup,
    /// Show CLI and configuration status
    Status,
    /// Run a task and wait for the final result
    Run {
        task: String,
        /// Override the configured timeout (seconds)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Run a task with live progress chunks
    Stream {
        task: String,
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Sandboxed workspace file operations
    Exec {
        #[command(subcommand)]
        action: ExecCommands,
    },
    /// Serve the workspace over HTTP
    Serve,
}

#[derive(Subcommand)]
enum ExecCommands {
    /// Create or overwrite a file in the workspace
    Write { path: String, content: String },
    /// Read a file from the workspace
    Read { path: String },
    /// List files in the workspace
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load Configuration
    let config = BridgeConfig::load(&cli.config)?;

    // 2. Logging Setup
    if !std::path::Path::new("data").exists() {
        fs::create_dir("data").context("Failed to create data directory")?;
    }

    let file_appender = tracing_appender::rolling::never("data", "session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("Starting claude-bridge...");

    // 3. Initialize the workspace
    let workspace_root = config.workspace_root(std::path::Path::new("data"));
    let guard = WorkspaceGuard::new(&workspace_root)?;
    let workspace = guard.root().to_path_buf();
    tracing::info!(workspace = %workspace.display(), "workspace initialized");

    // 4. Dispatch
    let output = match cli.command {
        Commands::Setup => commands::handle_setup(&config, &workspace).await?,
        Commands::Status => commands::handle_status(&config, &workspace).await?,
        Commands::Run { task, timeout } => {
            let executor = ClaudeExecutor::new(workspace.clone(), config.clone());
            commands::handle_run(&config, &executor, &task, timeout).await?
        }
        Commands::Stream { task, timeout } => {
            let executor = ClaudeExecutor::new(workspace.clone(), config.clone());
            let sink = StdoutSink;
            commands::handle_stream(&config, &executor, &task, timeout, &sink).await?
        }
        Commands::Exec { action } => {
            let tools = WorkspaceTools::new(guard);
            let action = match &action {
                ExecCommands::Write { path, content } => ExecAction::Write {
                    path: path.as_str(),
                    content: content.as_str(),
                },
                ExecCommands::Read { path } => ExecAction::Read { path: path.as_str() },
                ExecCommands::Ls { path } => ExecAction::List { path: path.as_str() },
            };
            commands::handle_exec(&tools, action).await?
        }
        Commands::Serve => commands::handle_serve(&config, &workspace).await?,
    };

    println!("{output}");
    Ok(())
}
