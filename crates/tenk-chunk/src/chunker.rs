//! Document-level chunking facade.

use std::sync::Arc;

use tracing::{debug, info};

use tenk_core::{
    Chunk, Chunker, ChunkingConfig, CompanyInfo, Document, DocumentChunks, Result, SectionBudget,
    SectionKey, SectionOutcome, TokenCounter,
};

use crate::annotate::MetadataAnnotator;
use crate::builder::ChunkBuilder;
use crate::normalize::normalize;
use crate::paragraph::ParagraphSegmenter;
use crate::sentence::SentenceSplitter;
use crate::structure::StructuralDetector;
use crate::tokens::build_token_counter;

/// A section that passed the QA threshold, ready to be chunked.
struct Section {
    key: SectionKey,
    normalized: String,
    budget: SectionBudget,
}

impl Section {
    /// Normalize and QA-check raw section text. Returns the unavailability
    /// reason when the section is missing or too short.
    fn prepare(
        key: SectionKey,
        raw: Option<&str>,
        config: &ChunkingConfig,
    ) -> std::result::Result<Self, String> {
        let normalized = raw.map(normalize).unwrap_or_default();
        let chars = normalized.chars().count();
        if chars < config.min_section_chars {
            return Err(format!("Too short or missing: {} chars", chars));
        }
        Ok(Self {
            key,
            normalized,
            budget: config.budget_for(key),
        })
    }
}

/// Structural 10-K chunker: headers label chunks, risk openers (item1a)
/// start them, and paragraphs are packed under per-section token budgets.
///
/// Filings without any structural cues reduce to plain paragraph packing
/// with overlap.
pub struct FilingChunker {
    config: ChunkingConfig,
    counter: Arc<dyn TokenCounter>,
    detector: StructuralDetector,
    segmenter: ParagraphSegmenter,
    splitter: SentenceSplitter,
    annotator: MetadataAnnotator,
}

impl FilingChunker {
    /// Create a chunker with the configured token counter.
    pub fn new(config: ChunkingConfig) -> Self {
        let counter = build_token_counter(&config);
        Self::with_token_counter(config, counter)
    }

    /// Create a chunker with an explicit token counter.
    pub fn with_token_counter(config: ChunkingConfig, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            segmenter: ParagraphSegmenter::new(config.min_paragraph_chars),
            config,
            counter,
            detector: StructuralDetector::default(),
            splitter: SentenceSplitter::new(),
            annotator: MetadataAnnotator,
        }
    }

    /// Replace the sentence splitter used for oversized paragraphs.
    pub fn with_sentence_splitter(mut self, splitter: SentenceSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn token_counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    /// Chunk a single section's raw text.
    ///
    /// Returns [`SectionOutcome::Unavailable`] when the text is missing or
    /// shorter than `min_section_chars` after normalization.
    pub fn chunk_section(
        &self,
        raw: Option<&str>,
        key: SectionKey,
        company: &CompanyInfo,
    ) -> SectionOutcome {
        match Section::prepare(key, raw, &self.config) {
            Ok(section) => SectionOutcome::Chunked(self.chunk_prepared(&section, company)),
            Err(reason) => SectionOutcome::Unavailable { reason },
        }
    }

    fn chunk_prepared(&self, section: &Section, company: &CompanyInfo) -> Vec<Chunk> {
        let counter = self.counter.as_ref();
        let paragraphs =
            self.segmenter
                .segment(&section.normalized, section.key, &self.detector, counter);

        if !paragraphs.iter().any(|p| p.is_header || p.is_risk_start) {
            debug!(
                "No structural cues in {} {}, packing paragraphs only",
                company.ticker, section.key
            );
        }

        let raw_chunks = ChunkBuilder::new(
            section.budget,
            counter,
            &self.splitter,
            section.key.is_risk_factors(),
        )
        .build(&paragraphs);

        self.annotator
            .annotate_section(raw_chunks, section.key, company)
    }
}

impl Chunker for FilingChunker {
    fn chunk_document(&self, document: &Document) -> Result<DocumentChunks> {
        document.validate()?;

        let key = document.key();
        let company = document.company_info();
        let mut sections = Vec::with_capacity(SectionKey::ALL.len());

        for section in SectionKey::ALL {
            let raw = document.sections.get(&section).map(String::as_str);
            let outcome = self.chunk_section(raw, section, &company);
            match &outcome {
                SectionOutcome::Chunked(chunks) => {
                    info!("{} {}: {} chunks", key, section, chunks.len());
                }
                SectionOutcome::Unavailable { reason } => {
                    info!("{} {}: unavailable ({})", key, section, reason);
                }
            }
            sections.push((section, outcome));
        }

        Ok(DocumentChunks { key, sections })
    }
}
