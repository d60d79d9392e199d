//! # Execution Engine
//!
//! Composes the command builder, process runner and output parsers into the
//! two execution modes: blocking JSON and streaming with progress chunks.

use crate::domain::config::BridgeConfig;
use crate::domain::errors::BridgeError;
use crate::domain::traits::ProgressSink;
use crate::domain::types::ExecutionOutcome;
use crate::infrastructure::command::{CLAUDE_BIN, CommandBuilder, OutputMode};
use crate::infrastructure::output::OutputParser;
use crate::infrastructure::process::ProcessRunner;
use crate::infrastructure::stream::StreamProcessor;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Executes Claude Code tasks inside the workspace.
pub struct ClaudeExecutor {
    workspace: PathBuf,
    config: BridgeConfig,
    builder: CommandBuilder,
    runner: ProcessRunner,
    output_parser: OutputParser,
    stream_processor: StreamProcessor,
}

impl ClaudeExecutor {
    pub fn new(workspace: PathBuf, config: BridgeConfig) -> Self {
        Self {
            workspace,
            config,
            builder: CommandBuilder::new(),
            runner: ProcessRunner::new(),
            output_parser: OutputParser::new(),
            stream_processor: StreamProcessor::new(),
        }
    }

    /// Timeout from the per-call override, falling back to config.
    fn resolve_timeout(&self, override_secs: Option<u64>) -> Duration {
        Duration::from_secs(override_secs.unwrap_or(self.config.timeout_seconds))
    }

    fn preview(task: &str) -> String {
        match task.char_indices().nth(50) {
            Some((idx, _)) => format!("{}...", &task[..idx]),
            None => task.to_string(),
        }
    }

    /// Run a task in blocking mode: wait for the final JSON document.
    pub async fn execute(
        &self,
        task: &str,
        timeout_secs: Option<u64>,
    ) -> Result<ExecutionOutcome, BridgeError> {
        let timeout = self.resolve_timeout(timeout_secs);
        tracing::info!(task = %Self::preview(task), timeout_secs = timeout.as_secs(), "executing task");
        let started = Instant::now();

        let args = self
            .builder
            .build(task, &self.workspace, &self.config, OutputMode::Json);
        let raw = self
            .runner
            .run(CLAUDE_BIN, &args, Some(&self.workspace), timeout)
            .await?;

        let result = self.output_parser.parse(&raw, started.elapsed());
        match &result {
            Ok(outcome) => tracing::info!(
                duration_ms = outcome.duration.as_millis() as u64,
                cost_usd = outcome.cost_usd,
                "task completed"
            ),
            Err(e) => tracing::warn!(code = e.code(), error = %e, "task failed"),
        }
        result
    }

    /// Run a task in streaming mode, forwarding chunks to the sink.
    pub async fn execute_stream(
        &self,
        task: &str,
        timeout_secs: Option<u64>,
        sink: &dyn ProgressSink,
    ) -> Result<ExecutionOutcome, BridgeError> {
        let timeout = self.resolve_timeout(timeout_secs);
        tracing::info!(task = %Self::preview(task), timeout_secs = timeout.as_secs(), "executing task (stream)");
        let started = Instant::now();

        let args =
            self.builder
                .build(task, &self.workspace, &self.config, OutputMode::StreamJson);
        let stream = self
            .runner
            .spawn_stream(CLAUDE_BIN, &args, Some(&self.workspace))?;

        // The child has kill_on_drop set, so an elapsed timeout tears the
        // process down when the processing future is dropped.
        let result = tokio::time::timeout(timeout, self.stream_processor.process(stream, sink, started))
            .await
            .unwrap_or(Err(BridgeError::Timeout {
                seconds: timeout.as_secs(),
            }));

        match &result {
            Ok(outcome) => tracing::info!(
                duration_ms = outcome.duration.as_millis() as u64,
                "stream task completed"
            ),
            Err(e) => tracing::warn!(code = e.code(), error = %e, "stream task failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> ClaudeExecutor {
        let config = BridgeConfig {
            auth_token: "sk".into(),
            timeout_seconds: 30,
            ..Default::default()
        };
        ClaudeExecutor::new(PathBuf::from("/tmp"), config)
    }

    #[test]
    fn timeout_override_beats_config() {
        let exec = executor();
        assert_eq!(exec.resolve_timeout(None), Duration::from_secs(30));
        assert_eq!(exec.resolve_timeout(Some(90)), Duration::from_secs(90));
    }

    #[test]
    fn preview_truncates_long_tasks() {
        let long = "x".repeat(120);
        let preview = ClaudeExecutor::preview(&long);
        assert!(preview.len() <= 53);
        assert!(preview.ends_with("..."));
        assert_eq!(ClaudeExecutor::preview("short"), "short");
    }
}
