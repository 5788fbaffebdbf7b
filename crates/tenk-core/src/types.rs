//! Core domain types for filing chunking.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, TenkError};

/// Disclosure item within a 10-K filing. Declaration order is processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    /// Item 1, business description.
    Item1,
    /// Item 1A, risk factors.
    Item1a,
}

impl SectionKey {
    /// All recognised sections in processing order.
    pub const ALL: [SectionKey; 2] = [SectionKey::Item1, SectionKey::Item1a];

    /// Key as it appears in chunk ids and metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item1 => "item1",
            Self::Item1a => "item1a",
        }
    }

    /// Parse a section key, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "item1" => Some(Self::Item1),
            "item1a" => Some(Self::Item1a),
            _ => None,
        }
    }

    /// Whether risk-factor detection and classification apply.
    pub fn is_risk_factors(&self) -> bool {
        matches!(self, Self::Item1a)
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword-driven classification of a risk-factor chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Operational,
    Financial,
    Regulatory,
    Competitive,
    Cybersecurity,
    Technological,
    Reputational,
    General,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Financial => "financial",
            Self::Regulatory => "regulatory",
            Self::Competitive => "competitive",
            Self::Cybersecurity => "cybersecurity",
            Self::Technological => "technological",
            Self::Reputational => "reputational",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved 10-K filing, as supplied by the filing source.
///
/// The engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub ticker: String,
    pub company_name: String,
    pub cik: String,
    pub filing_date: String,
    pub fiscal_year: i32,
    pub form_type: String,
    pub industry: String,
    pub sic_code: String,

    /// Raw section text keyed by disclosure item.
    #[serde(default)]
    pub sections: BTreeMap<SectionKey, String>,
}

impl Document {
    /// Identity used for checkpointing and error reports.
    pub fn key(&self) -> String {
        format!("{}_{}", self.ticker, self.fiscal_year)
    }

    /// Company and filing fields carried into every chunk.
    pub fn company_info(&self) -> CompanyInfo {
        CompanyInfo {
            ticker: self.ticker.clone(),
            company_name: self.company_name.clone(),
            cik: self.cik.clone(),
            filing_date: self.filing_date.clone(),
            fiscal_year: self.fiscal_year,
            form_type: self.form_type.clone(),
            industry: self.industry.clone(),
            sic_code: self.sic_code.clone(),
        }
    }

    /// Reject documents whose identity fields cannot produce stable chunk ids.
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(TenkError::invalid_document(self.key(), "empty ticker"));
        }
        if self.fiscal_year <= 0 {
            return Err(TenkError::invalid_document(
                self.key(),
                format!("invalid fiscal year {}", self.fiscal_year),
            ));
        }
        if self.sections.is_empty() {
            return Err(TenkError::MissingSections { key: self.key() });
        }
        Ok(())
    }
}

/// Company and filing metadata shared by all chunks of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub ticker: String,
    pub company_name: String,
    pub cik: String,
    pub filing_date: String,
    pub fiscal_year: i32,
    pub form_type: String,
    pub industry: String,
    pub sic_code: String,
}

/// Structured metadata attached to each chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub ticker: String,
    pub company_name: String,
    pub cik: String,
    pub section: SectionKey,

    /// Most recent header seen before this chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsection: Option<String>,

    pub filing_date: String,
    pub fiscal_year: i32,
    pub form_type: String,
    pub industry: String,
    pub sic_code: String,

    /// Only set for item1a chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_type: Option<RiskCategory>,
}

/// A bounded span of section text ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{ticker}_{section}_{fiscal_year}_chunk_{index}`.
    pub chunk_id: String,

    /// Chunk text content.
    pub text: String,

    pub metadata: ChunkMetadata,

    /// Token count under the configured counter.
    pub token_count: usize,

    /// Index within the section (0-based).
    pub chunk_index: usize,

    /// Number of chunks in the section; filled in once the section is complete.
    pub total_chunks: usize,

    /// See [`content_hash`].
    pub content_hash: String,
}

impl Chunk {
    /// Create a chunk. `total_chunks` starts at zero until the section is complete.
    pub fn new(text: String, token_count: usize, chunk_index: usize, metadata: ChunkMetadata) -> Self {
        let chunk_id = chunk_id(
            &metadata.ticker,
            metadata.section,
            metadata.fiscal_year,
            chunk_index,
        );
        let content_hash = content_hash(&text);

        Self {
            chunk_id,
            text,
            metadata,
            token_count,
            chunk_index,
            total_chunks: 0,
            content_hash,
        }
    }
}

/// Build a deterministic chunk id.
pub fn chunk_id(ticker: &str, section: SectionKey, fiscal_year: i32, index: usize) -> String {
    format!("{}_{}_{}_chunk_{}", ticker, section.as_str(), fiscal_year, index)
}

/// Dedup fingerprint: MD5 of the lowercased, whitespace-collapsed text,
/// truncated to 16 hex characters.
pub fn content_hash(text: &str) -> String {
    let lowered = text.to_lowercase();
    let normalized = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    let digest = Md5::digest(normalized.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(16);
    hex
}

/// Result of chunking one section.
#[derive(Debug, Clone)]
pub enum SectionOutcome {
    /// Section produced these chunks, in index order.
    Chunked(Vec<Chunk>),

    /// Section was missing or failed the QA threshold; no chunks.
    Unavailable { reason: String },
}

impl SectionOutcome {
    pub fn chunks(&self) -> &[Chunk] {
        match self {
            Self::Chunked(chunks) => chunks,
            Self::Unavailable { .. } => &[],
        }
    }
}

/// All section outcomes for one document, in section order.
#[derive(Debug, Clone)]
pub struct DocumentChunks {
    /// [`Document::key`] of the source document.
    pub key: String,

    pub sections: Vec<(SectionKey, SectionOutcome)>,
}

impl DocumentChunks {
    /// Total chunks across all sections.
    pub fn chunk_count(&self) -> usize {
        self.sections.iter().map(|(_, o)| o.chunks().len()).sum()
    }

    /// Chunks of a single section, empty when unavailable or absent.
    pub fn section(&self, key: SectionKey) -> &[Chunk] {
        self.sections
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, o)| o.chunks())
            .unwrap_or(&[])
    }
}
