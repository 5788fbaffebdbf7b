//! Chunk identity, metadata and risk classification.

use tenk_core::{Chunk, ChunkMetadata, CompanyInfo, RiskCategory, SectionKey};

use crate::builder::RawChunk;

/// Keyword lists per risk category. Order breaks score ties.
pub const RISK_KEYWORDS: &[(RiskCategory, &[&str])] = &[
    (
        RiskCategory::Operational,
        &["operation", "satellite", "launch", "manufacture", "supply", "production"],
    ),
    (
        RiskCategory::Financial,
        &["financial", "liquidity", "cash", "revenue", "profit", "cost", "expense"],
    ),
    (
        RiskCategory::Regulatory,
        &["regulation", "compliance", "legal", "law", "government", "license"],
    ),
    (
        RiskCategory::Competitive,
        &["competition", "competitor", "market share", "pricing"],
    ),
    (
        RiskCategory::Cybersecurity,
        &["cyber", "security", "breach", "hack", "data", "privacy"],
    ),
    (
        RiskCategory::Technological,
        &["technology", "obsolete", "innovation", "development"],
    ),
    (
        RiskCategory::Reputational,
        &["reputation", "brand", "public", "media"],
    ),
];

/// Classify risk text by keyword occurrence counts.
///
/// Matching is case-insensitive substring counting, so "operations" scores
/// for "operation". The earliest category with the highest score wins;
/// no hits at all gives [`RiskCategory::General`].
pub fn classify_risk(text: &str) -> RiskCategory {
    let lowered = text.to_lowercase();
    let mut best = RiskCategory::General;
    let mut best_score = 0usize;

    for (category, keywords) in RISK_KEYWORDS {
        let score: usize = keywords.iter().map(|k| lowered.matches(k).count()).sum();
        if score > best_score {
            best = *category;
            best_score = score;
        }
    }

    best
}

/// Turns raw chunks into identified, fully-annotated chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataAnnotator;

impl MetadataAnnotator {
    pub fn annotate(
        &self,
        raw: RawChunk,
        section: SectionKey,
        company: &CompanyInfo,
        chunk_index: usize,
    ) -> Chunk {
        let risk_type = section
            .is_risk_factors()
            .then(|| classify_risk(&raw.text));

        let metadata = ChunkMetadata {
            ticker: company.ticker.clone(),
            company_name: company.company_name.clone(),
            cik: company.cik.clone(),
            section,
            subsection: raw.subsection,
            filing_date: company.filing_date.clone(),
            fiscal_year: company.fiscal_year,
            form_type: company.form_type.clone(),
            industry: company.industry.clone(),
            sic_code: company.sic_code.clone(),
            risk_type,
        };

        Chunk::new(raw.text, raw.token_count, chunk_index, metadata)
    }

    /// Annotate a whole section and fill in `total_chunks`.
    pub fn annotate_section(
        &self,
        raw_chunks: Vec<RawChunk>,
        section: SectionKey,
        company: &CompanyInfo,
    ) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = raw_chunks
            .into_iter()
            .enumerate()
            .map(|(index, raw)| self.annotate(raw, section, company, index))
            .collect();
        backfill_totals(&mut chunks);
        chunks
    }
}

/// Set `total_chunks` on every chunk of a completed section.
pub fn backfill_totals(chunks: &mut [Chunk]) {
    let total = chunks.len();
    for chunk in chunks.iter_mut() {
        chunk.total_chunks = total;
    }
}
