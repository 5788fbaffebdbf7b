//! Per-run statistics and the document error log.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use tenk_core::{Result, SectionKey, TenkError};

/// A document that could not be chunked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    /// Document key, or the source path when the document never loaded.
    pub document: String,
    pub error_code: String,
    pub message: String,
}

impl DocumentFailure {
    pub fn new(document: impl Into<String>, error: &TenkError) -> Self {
        Self {
            document: document.into(),
            error_code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// A section that produced no chunks because it was missing or too short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnavailableSection {
    pub document: String,
    pub section: SectionKey,
    pub reason: String,
}

/// Statistics for one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub documents_processed: usize,

    /// Documents already in the checkpoint.
    pub documents_skipped: usize,

    pub documents_failed: usize,

    pub chunks_written: usize,

    /// Chunks whose id was already in the checkpoint.
    pub chunks_skipped: usize,

    pub chunks_by_section: BTreeMap<SectionKey, usize>,

    pub unavailable_sections: Vec<UnavailableSection>,

    pub errors: Vec<DocumentFailure>,
}

impl BatchReport {
    /// Write the error list as pretty JSON. Returns `false` and writes
    /// nothing when no document failed.
    pub fn write_error_log(&self, path: &Path) -> Result<bool> {
        if self.errors.is_empty() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.errors)?)?;
        Ok(true)
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Documents processed: {}", self.documents_processed)?;
        writeln!(f, "Documents skipped:   {}", self.documents_skipped)?;
        writeln!(f, "Documents failed:    {}", self.documents_failed)?;
        writeln!(f, "Chunks written:      {}", self.chunks_written)?;
        if self.chunks_skipped > 0 {
            writeln!(f, "Chunks skipped:      {}", self.chunks_skipped)?;
        }
        for (section, count) in &self.chunks_by_section {
            writeln!(f, "  {}: {}", section, count)?;
        }
        if !self.unavailable_sections.is_empty() {
            writeln!(
                f,
                "Unavailable sections: {}",
                self.unavailable_sections.len()
            )?;
        }
        Ok(())
    }
}
