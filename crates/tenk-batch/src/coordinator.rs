//! Batch coordinator: bounded parallel chunking with a single ordered writer.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info};

use tenk_core::{
    BatchConfig, Checkpoint, CheckpointStore, ChunkSink, Chunker, DocumentChunks, Result,
    SectionOutcome, TenkError,
};

use crate::report::{BatchReport, DocumentFailure, UnavailableSection};
use crate::source::DocumentInput;

/// What a worker hands to the writer for one input.
enum Processed {
    Chunked(DocumentChunks),
    Skipped { key: String },
    Failed { document: String, error: TenkError },
}

/// Drives documents through a [`Chunker`] and into a [`ChunkSink`].
///
/// Documents are chunked concurrently (up to `workers` at a time) but
/// written strictly in input order, one document at a time, by the task
/// that calls [`run`](Self::run). A failing document is recorded and
/// skipped; a failing sink or checkpoint store aborts the run.
pub struct BatchCoordinator<C> {
    chunker: Arc<C>,
    config: BatchConfig,
}

impl<C> BatchCoordinator<C>
where
    C: Chunker + 'static,
{
    pub fn new(chunker: Arc<C>, config: BatchConfig) -> Self {
        Self { chunker, config }
    }

    /// Process every input, resuming from the store's checkpoint.
    ///
    /// The checkpoint is saved every `checkpoint_interval` documents, after
    /// the sink has been flushed, and once more at the end of the run. On
    /// resume the sink is rewound to the position recorded with the
    /// checkpoint, so output from documents that were never checkpointed is
    /// written exactly once.
    pub async fn run<I, S, K>(&self, inputs: I, sink: &mut S, store: &mut K) -> Result<BatchReport>
    where
        I: IntoIterator<Item = DocumentInput>,
        S: ChunkSink,
        K: CheckpointStore,
    {
        let mut checkpoint = store.load()?;
        if !checkpoint.is_empty() {
            info!(
                "Resuming from checkpoint with {} processed ids",
                checkpoint.len()
            );
        }
        if let Some(offset) = checkpoint.output_offset {
            sink.rewind(offset)?;
        }

        // Skip decisions use the ids known at start; the writer owns the live set.
        let known: Arc<BTreeSet<String>> = Arc::new(checkpoint.processed_ids.clone());
        let timeout = self.config.document_timeout_secs.map(Duration::from_secs);
        let workers = self.config.workers.max(1);
        let interval = self.config.checkpoint_interval.max(1);

        let results = stream::iter(inputs.into_iter().map(|input| {
            let chunker = self.chunker.clone();
            let known = known.clone();
            async move { process(chunker, input, &known, timeout).await }
        }))
        .buffered(workers);
        futures::pin_mut!(results);

        let mut report = BatchReport::default();
        let mut since_save = 0usize;

        while let Some(processed) = results.next().await {
            match processed {
                Processed::Chunked(document) => {
                    write_document(&document, sink, &mut checkpoint, &mut report)?;
                    checkpoint.mark_processed(document.key.clone());
                    report.documents_processed += 1;

                    since_save += 1;
                    if since_save >= interval {
                        persist(sink, store, &mut checkpoint)?;
                        since_save = 0;
                    }
                }
                Processed::Skipped { key } => {
                    debug!("Skipping {}, already checkpointed", key);
                    report.documents_skipped += 1;
                }
                Processed::Failed { document, error } => {
                    error!("Failed to chunk {}: {}", document, error);
                    report.documents_failed += 1;
                    report.errors.push(DocumentFailure::new(document, &error));
                }
            }
        }

        persist(sink, store, &mut checkpoint)?;

        info!(
            "Batch complete: {} processed, {} skipped, {} failed, {} chunks written",
            report.documents_processed,
            report.documents_skipped,
            report.documents_failed,
            report.chunks_written
        );
        Ok(report)
    }
}

/// Flush the sink, then save the checkpoint with the sink's position.
fn persist<S, K>(sink: &mut S, store: &mut K, checkpoint: &mut Checkpoint) -> Result<()>
where
    S: ChunkSink,
    K: CheckpointStore,
{
    sink.flush()?;
    checkpoint.output_offset = sink.position();
    store.save(checkpoint)
}

async fn process<C>(
    chunker: Arc<C>,
    input: DocumentInput,
    known: &BTreeSet<String>,
    timeout: Option<Duration>,
) -> Processed
where
    C: Chunker + 'static,
{
    let document = match input.document {
        Ok(document) => document,
        Err(error) => {
            return Processed::Failed {
                document: input.origin,
                error,
            }
        }
    };

    let key = document.key();
    if known.contains(&key) {
        return Processed::Skipped { key };
    }

    let task = tokio::task::spawn_blocking(move || chunker.chunk_document(&document));
    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                return Processed::Failed {
                    error: TenkError::Timeout {
                        key: key.clone(),
                        secs: limit.as_secs(),
                    },
                    document: key,
                }
            }
        },
        None => task.await,
    };

    match joined {
        Ok(Ok(chunks)) => Processed::Chunked(chunks),
        Ok(Err(error)) => Processed::Failed {
            document: key,
            error,
        },
        Err(e) => Processed::Failed {
            document: key,
            error: TenkError::internal(format!("Chunking task failed: {}", e)),
        },
    }
}

/// Write one document's chunks in section and index order.
fn write_document<S: ChunkSink>(
    document: &DocumentChunks,
    sink: &mut S,
    checkpoint: &mut Checkpoint,
    report: &mut BatchReport,
) -> Result<()> {
    let mut written = 0usize;

    for (section, outcome) in &document.sections {
        match outcome {
            SectionOutcome::Chunked(chunks) => {
                for chunk in chunks {
                    if checkpoint.is_processed(&chunk.chunk_id) {
                        report.chunks_skipped += 1;
                        continue;
                    }
                    sink.write_chunk(chunk)?;
                    checkpoint.mark_processed(chunk.chunk_id.clone());
                    written += 1;
                    *report.chunks_by_section.entry(*section).or_default() += 1;
                }
            }
            SectionOutcome::Unavailable { reason } => {
                report.unavailable_sections.push(UnavailableSection {
                    document: document.key.clone(),
                    section: *section,
                    reason: reason.clone(),
                });
            }
        }
    }

    report.chunks_written += written;
    info!("{}: wrote {} chunks", document.key, written);
    Ok(())
}
