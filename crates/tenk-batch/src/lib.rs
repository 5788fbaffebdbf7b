//! tenk-batch - Batch coordination for filing chunking
//!
//! Reads extracted filings, chunks them with a bounded worker pool and
//! writes the chunks through a single ordered writer, checkpointing
//! progress so an interrupted run can resume without duplicates.

mod checkpoint;
mod coordinator;
mod report;
mod sink;
mod source;

pub use checkpoint::{JsonCheckpointStore, MemoryCheckpointStore};
pub use coordinator::BatchCoordinator;
pub use report::{BatchReport, DocumentFailure, UnavailableSection};
pub use sink::{JsonlSink, MemorySink};
pub use source::{load_filing, parse_filing, DocumentInput, FilingDirectory};

// Re-export types for convenience
pub use tenk_core::{BatchConfig, Checkpoint, CheckpointStore, ChunkSink};
