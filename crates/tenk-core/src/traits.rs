//! Core traits defining the interfaces between components.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::Result;
use crate::types::{Chunk, Document, DocumentChunks};

/// Token estimation strategy.
///
/// Implementations must be deterministic: same text, same count.
pub trait TokenCounter: Send + Sync {
    /// Count tokens in text.
    fn count(&self, text: &str) -> usize;

    /// Short strategy name for logs.
    fn name(&self) -> &'static str;
}

/// Token budget for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionBudget {
    /// Maximum tokens per chunk.
    pub max_tokens: usize,

    /// Minimum tokens for any chunk except the last of a section.
    pub min_chunk_tokens: usize,

    /// Overlap bound; a paragraph is re-used as overlap only when it is
    /// smaller than twice this value.
    pub overlap_tokens: usize,
}

/// Turns a document into per-section chunks.
pub trait Chunker: Send + Sync {
    /// Chunk every section of the document.
    ///
    /// Errors are document-level failures; missing or short sections are
    /// reported as unavailable inside the result instead.
    fn chunk_document(&self, document: &Document) -> Result<DocumentChunks>;
}

/// Destination for emitted chunks.
///
/// Called from a single writer; implementations need not be thread-safe.
pub trait ChunkSink: Send {
    /// Append one chunk.
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<()>;

    /// Make all written chunks durable.
    fn flush(&mut self) -> Result<()>;

    /// Durable length of the output, in the sink's own unit. Recorded in the
    /// checkpoint after each flush. `None` when the sink cannot rewind.
    fn position(&self) -> Option<u64> {
        None
    }

    /// Discard anything written past `position`, such as lines left behind
    /// by a run that died between checkpoints.
    fn rewind(&mut self, _position: u64) -> Result<()> {
        Ok(())
    }
}

/// Persisted set of processed identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Document keys and chunk ids already written.
    #[serde(default)]
    pub processed_ids: BTreeSet<String>,

    /// Unix millis of the last save.
    #[serde(default)]
    pub last_updated: u64,

    /// Sink position covered by `processed_ids`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_offset: Option<u64>,
}

impl Checkpoint {
    pub fn is_processed(&self, id: &str) -> bool {
        self.processed_ids.contains(id)
    }

    pub fn mark_processed(&mut self, id: impl Into<String>) {
        self.processed_ids.insert(id.into());
    }

    pub fn len(&self) -> usize {
        self.processed_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed_ids.is_empty()
    }
}

/// Storage for the checkpoint.
pub trait CheckpointStore: Send {
    /// Load the checkpoint, or an empty one if none exists.
    fn load(&mut self) -> Result<Checkpoint>;

    /// Persist the checkpoint, stamping `last_updated`.
    fn save(&mut self, checkpoint: &mut Checkpoint) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_marking() {
        let mut checkpoint = Checkpoint::default();
        assert!(checkpoint.is_empty());

        checkpoint.mark_processed("ACME_2024");
        checkpoint.mark_processed("ACME_2024");
        assert_eq!(checkpoint.len(), 1);
        assert!(checkpoint.is_processed("ACME_2024"));
        assert!(!checkpoint.is_processed("ACME_2023"));
    }

    #[test]
    fn test_checkpoint_json_shape() {
        let mut checkpoint = Checkpoint::default();
        checkpoint.mark_processed("b");
        checkpoint.mark_processed("a");
        let json = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(json["processed_ids"], serde_json::json!(["a", "b"]));
        assert_eq!(json["last_updated"], 0);
        assert!(json.get("output_offset").is_none());
    }

    #[test]
    fn test_checkpoint_without_offset_still_loads() {
        let checkpoint: Checkpoint =
            serde_json::from_str(r#"{"processed_ids": ["ACME_2024"], "last_updated": 5}"#).unwrap();
        assert_eq!(checkpoint.output_offset, None);

        let with_offset: Checkpoint =
            serde_json::from_str(r#"{"processed_ids": [], "output_offset": 812}"#).unwrap();
        assert_eq!(with_offset.output_offset, Some(812));
    }
}
