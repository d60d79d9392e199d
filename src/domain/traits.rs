//! # Domain Traits
//!
//! Abstract interfaces for pluggable implementations in the Infrastructure
//! and Interface layers.

use crate::domain::types::StreamChunk;
use async_trait::async_trait;

/// Receives streaming progress while a task runs.
///
/// Implementations forward chunks to wherever the host wants them
/// (chat message edits, stdout, a log). Sink failures must never abort
/// the execution; the stream processor logs and continues.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn on_chunk(&self, chunk: &StreamChunk);
}

/// A sink that drops everything. Used when no progress reporting is wanted.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl ProgressSink for NullSink {
    async fn on_chunk(&self, _chunk: &StreamChunk) {}
}
