//! tenk-chunk - 10-K section chunking engine
//!
//! Turns the raw text of a filing's business (item1) and risk factor
//! (item1a) sections into token-bounded, overlapping, annotated chunks.
//!
//! # Pipeline
//!
//! normalize -> segment paragraphs -> tag headers and risk openers ->
//! pack under the section budget (splitting oversized paragraphs by
//! sentence) -> attach ids, hashes and metadata.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use tenk_chunk::{Chunker, FilingChunker};
//! use tenk_core::{ChunkingConfig, Document, SectionKey};
//!
//! let mut sections = BTreeMap::new();
//! sections.insert(SectionKey::Item1, "We make widgets for industrial customers. ".repeat(20));
//! let document = Document {
//!     ticker: "WDGT".into(),
//!     company_name: "Widget Co".into(),
//!     cik: "42".into(),
//!     filing_date: "2024-02-01".into(),
//!     fiscal_year: 2023,
//!     form_type: "10-K".into(),
//!     industry: "Unknown".into(),
//!     sic_code: "Unknown".into(),
//!     sections,
//! };
//!
//! let chunker = FilingChunker::new(ChunkingConfig::default());
//! let result = chunker.chunk_document(&document).unwrap();
//! assert_eq!(result.section(SectionKey::Item1).len(), 1);
//! ```

mod annotate;
mod builder;
mod chunker;
mod normalize;
mod paragraph;
mod sentence;
mod structure;
mod tokens;

pub use annotate::{backfill_totals, classify_risk, MetadataAnnotator, RISK_KEYWORDS};
pub use builder::{ChunkBuilder, RawChunk};
pub use chunker::FilingChunker;
pub use normalize::normalize;
pub use paragraph::{Paragraph, ParagraphSegmenter};
pub use sentence::{
    punctuation_split, RuleSentenceDetector, SentenceDetector, SentenceGroups, SentenceSplitter,
};
pub use structure::{PatternSet, StructuralDetector, Structure, MAX_HEADER_CHARS};
pub use tokens::{
    build_token_counter, exact_counter, ApproximateCounter, HfTokenCounter, TiktokenCounter,
};

// Re-export types for convenience
pub use tenk_core::{Chunk, Chunker, ChunkingConfig, SectionKey, TokenCounter};
