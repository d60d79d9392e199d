//! # Execution Types
//!
//! Typed results and streaming chunks produced by the execution engine.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Permission mode forwarded unmodified to the external CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PermissionMode {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "acceptEdits")]
    AcceptEdits,
    #[serde(rename = "plan")]
    Plan,
    #[serde(rename = "dontAsk")]
    DontAsk,
}

impl PermissionMode {
    /// The flag value the CLI expects.
    pub fn as_flag(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AcceptEdits => "acceptEdits",
            Self::Plan => "plan",
            Self::DontAsk => "dontAsk",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_flag())
    }
}

/// Final result of a CLI task run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    /// Main output text from the assistant.
    pub output: String,
    /// Spend reported by the CLI. Zero in stream mode (not reported there).
    pub cost_usd: f64,
    /// Session identifier, empty if the CLI did not report one.
    pub session_id: String,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Raw decoded JSON document, when one was produced.
    pub raw: Option<serde_json::Value>,
}

/// Classification of a single `stream-json` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Thinking,
    ToolUse,
    Result,
    Error,
    Status,
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Thinking => "thinking",
            Self::ToolUse => "tool_use",
            Self::Result => "result",
            Self::Error => "error",
            Self::Status => "status",
        };
        f.write_str(label)
    }
}

/// One chunk of streaming output.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub kind: ChunkKind,
    pub content: String,
    /// The `type` field of the originating JSON line, or "raw" for plain text.
    pub raw_type: String,
    /// Session identifier when the line carried one (the init chunk does).
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_mode_flags() {
        assert_eq!(PermissionMode::AcceptEdits.as_flag(), "acceptEdits");
        assert_eq!(PermissionMode::default(), PermissionMode::Default);
    }

    #[test]
    fn permission_mode_deserializes_from_panel_value() {
        let mode: PermissionMode = serde_yaml::from_str("dontAsk").unwrap();
        assert_eq!(mode, PermissionMode::DontAsk);
    }
}
