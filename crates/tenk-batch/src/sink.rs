//! Chunk sinks.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use tenk_core::{Chunk, ChunkSink, Result, TenkError};

/// Appends one JSON object per chunk to a file.
///
/// The file is opened in append mode, so a resumed batch extends the
/// output of the interrupted one. Its byte length is the sink position;
/// rewinding truncates the file back to a checkpointed length.
pub struct JsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
    len: u64,
}

impl JsonlSink {
    /// Open (or create) the output file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TenkError::sink(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| TenkError::sink(format!("Failed to open {}: {}", path.display(), e)))?;
        let len = file
            .metadata()
            .map_err(|e| TenkError::sink(format!("Failed to stat {}: {}", path.display(), e)))?
            .len();

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChunkSink for JsonlSink {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        let mut line = serde_json::to_vec(chunk)?;
        line.push(b'\n');
        self.writer.write_all(&line).map_err(|e| {
            TenkError::sink(format!("Failed to write {}: {}", chunk.chunk_id, e))
        })?;
        self.len += line.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .and_then(|_| self.writer.get_ref().sync_data())
            .map_err(|e| TenkError::sink(format!("Failed to flush {}: {}", self.path.display(), e)))
    }

    fn position(&self) -> Option<u64> {
        Some(self.len)
    }

    fn rewind(&mut self, position: u64) -> Result<()> {
        self.flush()?;
        let on_disk = self
            .writer
            .get_ref()
            .metadata()
            .map_err(|e| TenkError::sink(format!("Failed to stat {}: {}", self.path.display(), e)))?
            .len();

        if on_disk < position {
            warn!(
                "{} is {} bytes, shorter than checkpointed {}; keeping it",
                self.path.display(),
                on_disk,
                position
            );
            self.len = on_disk;
            return Ok(());
        }
        if on_disk > position {
            info!(
                "Discarding {} bytes written after the last checkpoint",
                on_disk - position
            );
            self.writer
                .get_ref()
                .set_len(position)
                .and_then(|_| self.writer.get_ref().sync_data())
                .map_err(|e| {
                    TenkError::sink(format!("Failed to truncate {}: {}", self.path.display(), e))
                })?;
        }
        self.len = position;
        Ok(())
    }
}

/// In-memory sink for tests and embedding in other pipelines.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    chunks: Arc<Mutex<Vec<Chunk>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn chunks(&self) -> Vec<Chunk> {
        self.chunks
            .lock()
            .map(|chunks| chunks.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().map(|chunks| chunks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChunkSink for MemorySink {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        self.chunks
            .lock()
            .map_err(|_| TenkError::sink("memory sink poisoned"))?
            .push(chunk.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Number of chunks held.
    fn position(&self) -> Option<u64> {
        Some(self.len() as u64)
    }

    fn rewind(&mut self, position: u64) -> Result<()> {
        self.chunks
            .lock()
            .map_err(|_| TenkError::sink("memory sink poisoned"))?
            .truncate(position as usize);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenk_core::{ChunkMetadata, SectionKey};
    use tempfile::TempDir;

    fn chunk(index: usize, text: &str) -> Chunk {
        let metadata = ChunkMetadata {
            ticker: "ACME".to_string(),
            company_name: "Acme Corp".to_string(),
            cik: "42".to_string(),
            section: SectionKey::Item1,
            subsection: None,
            filing_date: "2024-02-01".to_string(),
            fiscal_year: 2023,
            form_type: "10-K".to_string(),
            industry: "Unknown".to_string(),
            sic_code: "Unknown".to_string(),
            risk_type: None,
        };
        Chunk::new(text.to_string(), 3, index, metadata)
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_jsonl_one_object_per_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out").join("chunks.jsonl");

        let mut sink = JsonlSink::open(&path).unwrap();
        sink.write_chunk(&chunk(0, "first\nchunk")).unwrap();
        sink.write_chunk(&chunk(1, "second chunk")).unwrap();
        sink.flush().unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["chunk_id"], "ACME_item1_2023_chunk_0");
        assert_eq!(lines[0]["text"], "first\nchunk");
        assert_eq!(lines[1]["metadata"]["ticker"], "ACME");
    }

    #[test]
    fn test_jsonl_reopen_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chunks.jsonl");

        let mut sink = JsonlSink::open(&path).unwrap();
        sink.write_chunk(&chunk(0, "first")).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let mut sink = JsonlSink::open(&path).unwrap();
        sink.write_chunk(&chunk(1, "second")).unwrap();
        sink.flush().unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["chunk_index"], 1);
    }

    #[test]
    fn test_position_tracks_bytes_on_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chunks.jsonl");

        let mut sink = JsonlSink::open(&path).unwrap();
        assert_eq!(sink.position(), Some(0));
        sink.write_chunk(&chunk(0, "first")).unwrap();
        sink.flush().unwrap();

        let on_disk = std::fs::metadata(&path).unwrap().len();
        assert_eq!(sink.position(), Some(on_disk));
        drop(sink);

        assert_eq!(JsonlSink::open(&path).unwrap().position(), Some(on_disk));
    }

    #[test]
    fn test_rewind_drops_unrecorded_tail() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chunks.jsonl");

        let mut sink = JsonlSink::open(&path).unwrap();
        sink.write_chunk(&chunk(0, "kept")).unwrap();
        sink.flush().unwrap();
        let committed = sink.position().unwrap();
        sink.write_chunk(&chunk(1, "lost")).unwrap();
        sink.flush().unwrap();
        drop(sink);

        // Torn record from a killed process
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"chunk_id\": \"ACME_it").unwrap();
        drop(file);

        let mut sink = JsonlSink::open(&path).unwrap();
        sink.rewind(committed).unwrap();
        assert_eq!(sink.position(), Some(committed));
        sink.write_chunk(&chunk(1, "rewritten")).unwrap();
        sink.flush().unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["text"], "kept");
        assert_eq!(lines[1]["text"], "rewritten");
    }

    #[test]
    fn test_rewind_past_end_keeps_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chunks.jsonl");

        let mut sink = JsonlSink::open(&path).unwrap();
        sink.write_chunk(&chunk(0, "only")).unwrap();
        sink.rewind(10_000).unwrap();

        let on_disk = std::fs::metadata(&path).unwrap().len();
        assert_eq!(sink.position(), Some(on_disk));
        assert_eq!(read_lines(&path).len(), 1);
    }

    #[test]
    fn test_memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.write_chunk(&chunk(0, "text")).unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.chunks()[0].text, "text");

        writer.write_chunk(&chunk(1, "more")).unwrap();
        assert_eq!(sink.position(), Some(2));
        writer.rewind(1).unwrap();
        assert_eq!(sink.len(), 1);
    }
}
