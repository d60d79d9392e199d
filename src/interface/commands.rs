//! # Command Handlers
//!
//! One handler per CLI subcommand. Handlers return the text to show the
//! user; `main` owns printing and exit codes.

use crate::application::executor::ClaudeExecutor;
use crate::application::workspace_tools::{WorkspaceTools, format_listing};
use crate::domain::config::BridgeConfig;
use crate::domain::paths::ClaudePaths;
use crate::domain::traits::ProgressSink;
use crate::domain::types::ExecutionOutcome;
use crate::infrastructure::installer::{CliInstaller, InstallStatus};
use crate::infrastructure::marketplace::MarketplaceManager;
use crate::infrastructure::server::ServerManager;
use crate::infrastructure::settings::SettingsWriter;
use anyhow::{Context, Result, anyhow};
use std::path::Path;

fn claude_paths() -> Result<ClaudePaths> {
    ClaudePaths::new().context("Could not determine the home directory")
}

/// Install the CLI if needed, apply settings, write CLAUDE.md, install skills.
pub async fn handle_setup(config: &BridgeConfig, workspace: &Path) -> Result<String> {
    config.validate()?;

    let installer = CliInstaller::new();
    let status = installer
        .ensure_installed(config.auto_install_claude)
        .await?;
    let mut report = match &status {
        InstallStatus::Installed(Some(version)) => format!("CLI ready: {version}\n"),
        InstallStatus::Installed(None) => "CLI ready (version unknown)\n".to_string(),
        InstallStatus::Missing => {
            return Err(anyhow!(
                "claude CLI is not installed and auto_install_claude is disabled"
            ));
        }
    };

    let paths = claude_paths()?;
    let settings = SettingsWriter::new(paths.clone());
    settings.apply(config).await?;
    report.push_str("Settings applied\n");

    settings.write_claude_md(config, workspace).await?;
    if !config.claude_md.is_empty() {
        report.push_str("CLAUDE.md written\n");
    }

    if !config.skills_to_install.is_empty() {
        let marketplace = MarketplaceManager::new(paths);
        for (skill, result) in marketplace.install_skills(&config.skills_to_install).await {
            match result {
                Ok(msg) => report.push_str(&format!("{msg}\n")),
                Err(e) => report.push_str(&format!("skill {skill} failed: {e}\n")),
            }
        }
    }

    Ok(report)
}

/// CLI presence, version, workspace and config summary.
pub async fn handle_status(config: &BridgeConfig, workspace: &Path) -> Result<String> {
    let installer = CliInstaller::new();
    let cli_line = match installer.version().await {
        Some(version) => format!("CLI: {version}"),
        None if installer.is_installed() => "CLI: installed (version probe failed)".to_string(),
        None => "CLI: not installed".to_string(),
    };

    let config_line = match config.validate() {
        Ok(()) => format!("Config: ok ({})", config.summary()),
        Err(e) => format!("Config: INVALID - {e}"),
    };

    Ok(format!(
        "{cli_line}\n{config_line}\nWorkspace: {}",
        workspace.display()
    ))
}

/// Run a task in blocking mode and format the result with its cost footer.
pub async fn handle_run(
    config: &BridgeConfig,
    executor: &ClaudeExecutor,
    task: &str,
    timeout: Option<u64>,
) -> Result<String> {
    config.validate()?;
    let outcome = executor.execute(task, timeout).await?;
    Ok(format!(
        "{}\n\n[Cost: ${:.4} | Time: {:.1}s]",
        outcome.output,
        outcome.cost_usd,
        outcome.duration.as_secs_f64()
    ))
}

/// Run a task in streaming mode; chunks go to the sink as they arrive.
/// The sink only shows truncated previews, so the full output is returned
/// here once the run finishes.
pub async fn handle_stream(
    config: &BridgeConfig,
    executor: &ClaudeExecutor,
    task: &str,
    timeout: Option<u64>,
    sink: &dyn ProgressSink,
) -> Result<String> {
    config.validate()?;
    let outcome = executor.execute_stream(task, timeout, sink).await?;
    Ok(render_stream_result(&outcome))
}

fn render_stream_result(outcome: &ExecutionOutcome) -> String {
    format!(
        "{}\n\n[Done in {:.1}s]",
        outcome.output,
        outcome.duration.as_secs_f64()
    )
}

/// The `claude_exec` file-operation surface.
pub enum ExecAction<'a> {
    Write { path: &'a str, content: &'a str },
    Read { path: &'a str },
    List { path: &'a str },
}

pub async fn handle_exec(tools: &WorkspaceTools, action: ExecAction<'_>) -> Result<String> {
    match action {
        ExecAction::Write { path, content } => {
            let written = tools.write_file(path, content).await?;
            Ok(format!("Wrote {}", written.display()))
        }
        ExecAction::Read { path } => Ok(tools.read_file(path).await?),
        ExecAction::List { path } => {
            let entries = tools.list_files(path).await?;
            if entries.is_empty() {
                Ok("(empty)".to_string())
            } else {
                Ok(format_listing(&entries))
            }
        }
    }
}

/// Start the deployment server and block until interrupted.
pub async fn handle_serve(config: &BridgeConfig, workspace: &Path) -> Result<String> {
    let mut manager = ServerManager::new(workspace, config.http_server_port);
    if !manager.start().await? {
        return Ok("Deployment server disabled (http_server_port: 0)".to_string());
    }

    println!(
        "Serving {} on port {} (ctrl-c to stop)",
        workspace.display(),
        manager.port()
    );
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for ctrl-c")?;
    manager.stop().await?;
    Ok("Server stopped".to_string())
}
