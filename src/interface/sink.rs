//! # Console Progress Sink
//!
//! Prints streaming chunks to stdout, one line per chunk, the same shape the
//! chat surface uses for live progress edits.

use crate::domain::traits::ProgressSink;
use crate::domain::types::{ChunkKind, StreamChunk};
use async_trait::async_trait;

const MAX_PREVIEW_CHARS: usize = 100;

/// Writes `[kind] content` lines to stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

fn truncate(content: &str) -> String {
    match content.char_indices().nth(MAX_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

fn label(kind: ChunkKind) -> &'static str {
    match kind {
        ChunkKind::Thinking => "[Thinking]",
        ChunkKind::ToolUse => "[Tool]",
        ChunkKind::Result => "[Result]",
        ChunkKind::Error => "[Error]",
        ChunkKind::Status => "[Status]",
    }
}

#[async_trait]
impl ProgressSink for StdoutSink {
    async fn on_chunk(&self, chunk: &StreamChunk) {
        println!("{} {}", label(chunk.kind), truncate(&chunk.content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_is_char_safe() {
        let short = truncate("hello");
        assert_eq!(short, "hello");

        let long = "é".repeat(150);
        let cut = truncate(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), MAX_PREVIEW_CHARS + 3);
    }

    #[test]
    fn labels_cover_all_kinds() {
        assert_eq!(label(ChunkKind::ToolUse), "[Tool]");
        assert_eq!(label(ChunkKind::Status), "[Status]");
    }
}
