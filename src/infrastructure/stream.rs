//! # Stream Parsing
//!
//! Handles `--output-format stream-json`: one JSON document per line while
//! the task runs. `ChunkParser` classifies single lines; `StreamProcessor`
//! drives a child process, feeds a progress sink and folds the chunks into
//! a final outcome.

use crate::domain::errors::BridgeError;
use crate::domain::traits::ProgressSink;
use crate::domain::types::{ChunkKind, ExecutionOutcome, StreamChunk};
use crate::infrastructure::process::StreamingChild;
use std::time::Instant;

/// Fields probed, in order, when extracting display content from a chunk.
const CONTENT_FIELDS: [&str; 5] = ["content", "text", "message", "result", "output"];

/// Parses individual stream-json lines. Pure, line-by-line transformation.
#[derive(Debug, Default)]
pub struct ChunkParser;

impl ChunkParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one stripped line. Returns None for empty lines. Lines that are
    /// not JSON become raw Status chunks rather than being dropped.
    pub fn parse_line(&self, line: &str) -> Option<StreamChunk> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(data) => Some(StreamChunk {
                kind: classify(&data),
                content: extract_content(&data),
                raw_type: data
                    .get("type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                session_id: data
                    .get("session_id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            }),
            Err(_) => Some(StreamChunk {
                kind: ChunkKind::Status,
                content: line.to_string(),
                raw_type: "raw".to_string(),
                session_id: None,
            }),
        }
    }
}

fn classify(data: &serde_json::Value) -> ChunkKind {
    if let Some(type_str) = data.get("type").and_then(|v| v.as_str()) {
        let type_lower = type_str.to_lowercase();
        if type_lower.contains("think") {
            return ChunkKind::Thinking;
        }
        if type_lower.contains("tool") {
            return ChunkKind::ToolUse;
        }
        if type_lower.contains("error") {
            return ChunkKind::Error;
        }
        if type_lower.contains("result") {
            return ChunkKind::Result;
        }
    }

    let is_error = data
        .get("is_error")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if is_error || data.get("error").is_some() {
        return ChunkKind::Error;
    }

    if data.get("result").is_some() || data.get("output").is_some() {
        return ChunkKind::Result;
    }

    ChunkKind::Status
}

fn extract_content(data: &serde_json::Value) -> String {
    for field in CONTENT_FIELDS {
        if let Some(value) = data.get(field) {
            match value {
                serde_json::Value::String(s) if !s.is_empty() => return s.clone(),
                serde_json::Value::Null | serde_json::Value::String(_) => {}
                other => return other.to_string(),
            }
        }
    }
    data.to_string()
}

/// Folds a streaming child's output into a final outcome.
pub struct StreamProcessor {
    parser: ChunkParser,
}

impl StreamProcessor {
    pub fn new() -> Self {
        Self {
            parser: ChunkParser::new(),
        }
    }

    /// Read the child's stdout to completion, forwarding every chunk to the
    /// sink. Cost is not reported in stream mode, so `cost_usd` stays zero.
    pub async fn process(
        &self,
        mut stream: StreamingChild,
        sink: &dyn ProgressSink,
        started: Instant,
    ) -> Result<ExecutionOutcome, BridgeError> {
        let mut accumulated: Vec<String> = Vec::new();
        let mut chunk_count = 0usize;
        let mut error_chunk: Option<StreamChunk> = None;
        let mut session_id = String::new();

        // Drain stderr alongside the stdout loop; a chatty child would
        // otherwise fill the pipe buffer and stall before stdout closes.
        let stderr_pipe = stream.take_stderr();
        let stderr_task = tokio::spawn(async move {
            let mut text = String::new();
            if let Some(mut pipe) = stderr_pipe {
                use tokio::io::AsyncReadExt;
                let _ = pipe.read_to_string(&mut text).await;
            }
            text
        });

        while let Some(line) = stream
            .lines
            .next_line()
            .await
            .map_err(|e| BridgeError::io("read", "stdout", e))?
        {
            let Some(chunk) = self.parser.parse_line(&line) else {
                continue;
            };
            chunk_count += 1;

            if chunk.kind == ChunkKind::Error && error_chunk.is_none() {
                error_chunk = Some(chunk.clone());
            }

            // The init chunk carries the session id; remember the last one seen.
            if let Some(id) = &chunk.session_id {
                session_id = id.clone();
            }

            sink.on_chunk(&chunk).await;

            if !chunk.content.is_empty() {
                accumulated.push(chunk.content);
            }
        }

        let status = stream
            .child
            .wait()
            .await
            .map_err(|e| BridgeError::io("wait", "claude", e))?;
        let stderr = stderr_task.await.unwrap_or_default();
        let duration = started.elapsed();

        tracing::debug!(chunk_count, code = ?status.code(), "stream completed");

        if !status.success() {
            return Err(BridgeError::Cli {
                message: format!("CLI exited with status {:?}", status.code()),
                stderr,
            });
        }

        if let Some(chunk) = error_chunk {
            return Err(BridgeError::Cli {
                message: if chunk.content.is_empty() {
                    "stream returned an error chunk".to_string()
                } else {
                    chunk.content
                },
                stderr,
            });
        }

        Ok(ExecutionOutcome {
            output: accumulated.join("\n"),
            session_id,
            duration,
            ..Default::default()
        })
    }
}

impl Default for StreamProcessor {
    fn default() -> Self {
        Self::new()
    }
}
