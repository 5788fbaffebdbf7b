//! Filing source: extracted 10-K JSON files on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use tenk_core::{Document, Result, SectionKey, TenkError};

const UNKNOWN: &str = "Unknown";

/// One unit of batch input: a loaded document or the reason it could not
/// be loaded.
#[derive(Debug)]
pub struct DocumentInput {
    /// Where the document came from, used in error reports.
    pub origin: String,
    pub document: Result<Document>,
}

impl DocumentInput {
    pub fn ready(document: Document) -> Self {
        Self {
            origin: document.key(),
            document: Ok(document),
        }
    }

    pub fn failed(origin: impl Into<String>, error: TenkError) -> Self {
        Self {
            origin: origin.into(),
            document: Err(error),
        }
    }
}

/// Identifier that the extractor may emit as a number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(i64),
    Text(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SectionRecord {
    #[serde(default)]
    text: Option<String>,
}

/// Extractor output for one filing. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct FilingRecord {
    ticker: String,
    company_name: String,
    cik: Scalar,
    #[serde(default = "default_form_type")]
    form_type: String,
    filing_date: String,
    fiscal_year: i32,
    #[serde(default)]
    industry: Option<Scalar>,
    #[serde(default)]
    sic_code: Option<Scalar>,
    #[serde(default)]
    sections: BTreeMap<String, SectionRecord>,
}

fn default_form_type() -> String {
    "10-K".to_string()
}

impl FilingRecord {
    fn into_document(self) -> Document {
        let sections = self
            .sections
            .into_iter()
            .filter_map(|(key, section)| Some((SectionKey::parse(&key)?, section.text?)))
            .collect();

        Document {
            ticker: self.ticker,
            company_name: self.company_name,
            cik: self.cik.into_string(),
            filing_date: self.filing_date,
            fiscal_year: self.fiscal_year,
            form_type: self.form_type,
            industry: self
                .industry
                .map(Scalar::into_string)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            sic_code: self
                .sic_code
                .map(Scalar::into_string)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            sections,
        }
    }
}

/// Parse one extracted filing.
///
/// Sections other than item1/item1a are ignored; a `null` section text is
/// treated as missing.
pub fn parse_filing(json: &str) -> serde_json::Result<Document> {
    let record: FilingRecord = serde_json::from_str(json)?;
    Ok(record.into_document())
}

/// Read and parse one extracted filing file.
pub fn load_filing(path: &Path) -> Result<Document> {
    let uri = path.display().to_string();
    let content =
        std::fs::read_to_string(path).map_err(|e| TenkError::load_failed(&uri, e.to_string()))?;
    parse_filing(&content).map_err(|e| TenkError::load_failed(&uri, e.to_string()))
}

/// Directory of extracted filings, one JSON file per filing.
#[derive(Debug, Clone)]
pub struct FilingDirectory {
    root: PathBuf,
}

impl FilingDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every `*.json` file directly under the root, sorted by path.
    ///
    /// Files starting with `_` are run artifacts (summaries, error logs) and
    /// are skipped.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
            let is_artifact = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('_'))
                .unwrap_or(true);

            if path.is_file() && is_json && !is_artifact {
                files.push(path);
            } else {
                debug!("Skipping {}", path.display());
            }
        }
        files.sort();

        info!("Found {} filings in {}", files.len(), self.root.display());
        Ok(files)
    }

    /// Lazily load every filing found by [`scan`](Self::scan).
    pub fn inputs(&self) -> Result<impl Iterator<Item = DocumentInput>> {
        let files = self.scan()?;
        Ok(files.into_iter().map(|path| match load_filing(&path) {
            Ok(document) => DocumentInput::ready(document),
            Err(e) => DocumentInput::failed(path.display().to_string(), e),
        }))
    }
}
