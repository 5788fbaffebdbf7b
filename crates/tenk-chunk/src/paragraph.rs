//! Paragraph segmentation of normalized section text.

use tracing::debug;

use tenk_core::{SectionKey, TokenCounter};

use crate::structure::StructuralDetector;

/// A blank-line delimited block of section text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub tokens: usize,
    pub is_header: bool,
    pub is_risk_start: bool,
}

/// Splits normalized text into ordered, tagged paragraphs.
#[derive(Debug, Clone)]
pub struct ParagraphSegmenter {
    /// Shorter paragraphs are dropped unless they carry structure.
    min_chars: usize,
}

impl ParagraphSegmenter {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    /// Segment normalized text, preserving source order.
    ///
    /// A leading header line glued to its body by a single newline becomes
    /// its own header paragraph. Short paragraphs survive only when they are
    /// headers or risk openers.
    pub fn segment(
        &self,
        normalized: &str,
        section: SectionKey,
        detector: &StructuralDetector,
        counter: &dyn TokenCounter,
    ) -> Vec<Paragraph> {
        let mut paragraphs = Vec::new();
        let mut dropped = 0usize;

        for raw in normalized.split("\n\n") {
            let candidate = raw.trim();
            if candidate.is_empty() {
                continue;
            }

            let parts = match detector.split_leading_header(candidate) {
                Some((header, body)) => vec![header, body],
                None => vec![candidate],
            };

            for text in parts {
                let structure = detector.classify(text, section);
                let carries_structure = structure.is_header || structure.is_risk_start;
                if !carries_structure && text.chars().count() < self.min_chars {
                    dropped += 1;
                    continue;
                }
                paragraphs.push(Paragraph {
                    text: text.to_string(),
                    tokens: counter.count(text),
                    is_header: structure.is_header,
                    is_risk_start: structure.is_risk_start,
                });
            }
        }

        debug!(
            "Segmented {}: {} paragraphs, {} dropped as noise",
            section,
            paragraphs.len(),
            dropped
        );

        paragraphs
    }
}

impl Default for ParagraphSegmenter {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::ApproximateCounter;

    fn segment(text: &str, section: SectionKey) -> Vec<Paragraph> {
        ParagraphSegmenter::new(20).segment(
            text,
            section,
            &StructuralDetector::default(),
            &ApproximateCounter,
        )
    }

    #[test]
    fn test_order_and_tokens() {
        let text = "The first paragraph describes the business.\n\nThe second paragraph covers customers.";
        let paragraphs = segment(text, SectionKey::Item1);

        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].text.starts_with("The first"));
        assert!(paragraphs[1].text.starts_with("The second"));
        assert_eq!(paragraphs[0].tokens, paragraphs[0].text.chars().count() / 4);
    }

    #[test]
    fn test_short_noise_dropped_headers_kept() {
        let text = "12\n\nHuman Capital\n\nWe employ about 4,000 people across nine countries.";
        let paragraphs = segment(text, SectionKey::Item1);

        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].is_header);
        assert_eq!(paragraphs[0].text, "Human Capital");
        assert!(!paragraphs[1].is_header);
    }

    #[test]
    fn test_leading_header_split_from_body() {
        let text = "Human Capital\nWe employ about 4,000 people across nine countries.";
        let paragraphs = segment(text, SectionKey::Item1);

        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].is_header);
        assert_eq!(paragraphs[1].text, "We employ about 4,000 people across nine countries.");
    }

    #[test]
    fn test_short_risk_opener_kept_in_item1a() {
        let text = "Risks of Debt\n\nOur indebtedness could limit our flexibility in planning.";
        let paragraphs = segment(text, SectionKey::Item1a);

        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].is_risk_start);
        assert!(paragraphs[1].is_risk_start);

        let item1 = segment(text, SectionKey::Item1);
        assert!(item1.iter().all(|p| !p.is_risk_start));
    }

    #[test]
    fn test_empty_text() {
        assert!(segment("", SectionKey::Item1).is_empty());
    }
}
