//! Header and risk-factor boundary detection.

use once_cell::sync::Lazy;
use regex::Regex;

use tenk_core::SectionKey;

/// Longest line still considered a header.
pub const MAX_HEADER_CHARS: usize = 100;

static FILING_PATTERNS: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        &[
            // "Overview:", "Our Business:"
            r"^[A-Z][A-Za-z\s&,]+:$",
            // "Human Capital Resources"
            r"^(?:[A-Z][a-z]+\s){1,5}[A-Z][a-z]+$",
            // "BUSINESS OVERVIEW"
            r"^[A-Z][A-Z\s&]+$",
            // "1. Business Description"
            r"^\d+\.\s+[A-Z][a-z]",
        ],
        &[
            r"^(?:We|Our|The Company|If|Failure|Any|Significant|Material)\s+(?:[\w\s]*?\s)?(?:may|might|could|would|will)\b",
            r"^[•·▪]\s*(?:We|Our|The)",
            r"^(?:Risks?\s+(?:Related|Relating|Factors?)|Risks?\s+(?:from|of|to))",
        ],
    )
    .expect("valid filing patterns")
});

/// Compiled header and risk-start patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    headers: Vec<Regex>,
    risk_starts: Vec<Regex>,
}

impl PatternSet {
    /// Compile a pattern set.
    pub fn new(headers: &[&str], risk_starts: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            headers: headers.iter().map(|p| Regex::new(p)).collect::<Result<_, _>>()?,
            risk_starts: risk_starts
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<_, _>>()?,
        })
    }

    /// The 10-K pattern set.
    pub fn filing() -> Self {
        FILING_PATTERNS.clone()
    }
}

/// Structural tags for one paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Structure {
    pub is_header: bool,
    pub is_risk_start: bool,
}

/// Flags header-like and risk-opening paragraphs.
#[derive(Debug, Clone)]
pub struct StructuralDetector {
    patterns: PatternSet,
}

impl StructuralDetector {
    pub fn new(patterns: PatternSet) -> Self {
        Self { patterns }
    }

    /// Classify a stripped paragraph. Risk starts are only reported for item1a.
    pub fn classify(&self, text: &str, section: SectionKey) -> Structure {
        Structure {
            is_header: self.is_header_line(text),
            is_risk_start: section.is_risk_factors() && self.is_risk_start(text),
        }
    }

    /// A header is a single short line matching one of the header patterns.
    pub fn is_header_line(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || text.contains('\n') || text.chars().count() > MAX_HEADER_CHARS {
            return false;
        }
        self.patterns.headers.iter().any(|p| p.is_match(text))
    }

    pub fn is_risk_start(&self, text: &str) -> bool {
        self.patterns.risk_starts.iter().any(|p| p.is_match(text))
    }

    /// Split `"Header\nbody..."` into its header line and body.
    pub fn split_leading_header<'a>(&self, text: &'a str) -> Option<(&'a str, &'a str)> {
        let (first, rest) = text.split_once('\n')?;
        let rest = rest.trim();
        if rest.is_empty() || !self.is_header_line(first) {
            return None;
        }
        Some((first.trim(), rest))
    }
}

impl Default for StructuralDetector {
    fn default() -> Self {
        Self::new(PatternSet::filing())
    }
}
