//! # Command Builder
//!
//! Builds the argument vector for the external CLI. Pure transformation of
//! task + config + workspace into an argv; no subprocess execution here.
//! Arguments are passed as a vector, never through a shell, so task text
//! needs no escaping.

use crate::domain::config::BridgeConfig;
use crate::domain::types::PermissionMode;
use std::path::Path;

/// Binary name of the external CLI.
pub const CLAUDE_BIN: &str = "claude";

/// Output format selector for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One JSON document on stdout when the task finishes.
    Json,
    /// Newline-delimited JSON chunks while the task runs.
    StreamJson,
}

/// Builds `claude` CLI argument vectors.
#[derive(Debug, Default)]
pub struct CommandBuilder;

impl CommandBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the full argv (excluding the binary itself).
    pub fn build(
        &self,
        task: &str,
        workspace: &Path,
        config: &BridgeConfig,
        mode: OutputMode,
    ) -> Vec<String> {
        let format = match mode {
            OutputMode::Json => "json",
            OutputMode::StreamJson => "stream-json",
        };

        let mut args = vec![
            "-p".to_string(),
            task.to_string(),
            "--output-format".to_string(),
            format.to_string(),
        ];

        // stream-json requires --verbose when combined with -p
        if mode == OutputMode::StreamJson {
            args.push("--verbose".to_string());
        }

        if !config.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(restrict_allowed_tools(&config.allowed_tools, workspace));
        }

        if !config.disallowed_tools.is_empty() {
            args.push("--disallowedTools".to_string());
            args.push(config.disallowed_tools.join(","));
        }

        if config.permission_mode != PermissionMode::Default {
            args.push("--permission-mode".to_string());
            args.push(config.permission_mode.as_flag().to_string());
        }

        for dir in &config.add_dirs {
            args.push("--add-dir".to_string());
            args.push(dir.clone());
        }

        if config.max_turns > 0 {
            args.push("--max-turns".to_string());
            args.push(config.max_turns.to_string());
        }

        if !config.model.is_empty() {
            args.push("--model".to_string());
            args.push(config.model.clone());
        }

        if let Some(budget) = config.max_budget_usd {
            args.push("--max-budget-usd".to_string());
            args.push(format!("{budget}"));
        }

        args
    }
}

/// Join the allow list, rewriting the bare `Bash` tool to a workspace-scoped
/// `Bash(<workspace>/*)` so shell commands cannot roam the host.
fn restrict_allowed_tools(tools: &[String], workspace: &Path) -> String {
    let workspace_path = workspace.to_string_lossy().replace('\\', "/");
    tools
        .iter()
        .map(|tool| {
            if tool == "Bash" {
                format!("Bash({workspace_path}/*)")
            } else {
                tool.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
