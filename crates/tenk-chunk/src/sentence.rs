//! Sentence-level re-segmentation of oversized paragraphs.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use tenk_core::{Result, TokenCounter};

static TERMINAL_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid terminal punctuation regex"));

/// Words that end in a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "inc", "corp", "co", "ltd", "llc", "plc", "no", "nos", "mr", "mrs", "ms", "dr", "st", "jr",
    "sr", "vs", "approx", "u.s", "u.k", "e.g", "i.e", "jan", "feb", "mar", "apr", "jun", "jul",
    "aug", "sep", "sept", "oct", "nov", "dec", "fig", "sec", "dept", "est",
];

/// Sentence boundary detection.
pub trait SentenceDetector: Send + Sync {
    /// Split text into trimmed sentences in source order.
    fn sentences<'a>(&self, text: &'a str) -> Result<Vec<&'a str>>;
}

/// Abbreviation-aware rule detector.
///
/// A boundary is terminal punctuation (plus closing quotes or brackets),
/// whitespace, then something that can open a sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSentenceDetector;

impl RuleSentenceDetector {
    fn is_abbreviation(before_period: &str) -> bool {
        let word = before_period
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or("")
            .trim_start_matches(|c: char| matches!(c, '(' | '"' | '\'' | '“' | '‘'));

        let mut chars = word.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            // Single initial, as in "J. Smith"
            return c.is_uppercase();
        }

        let lowered = word.to_lowercase();
        ABBREVIATIONS.contains(&lowered.as_str())
    }

    fn opens_sentence(c: char) -> bool {
        c.is_uppercase()
            || c.is_ascii_digit()
            || matches!(c, '"' | '\'' | '(' | '[' | '“' | '‘' | '•')
    }

    fn closes_sentence(c: char) -> bool {
        matches!(c, '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '”' | '’')
    }
}

impl SentenceDetector for RuleSentenceDetector {
    fn sentences<'a>(&self, text: &'a str) -> Result<Vec<&'a str>> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            let (pos, c) = chars[i];
            if !matches!(c, '.' | '!' | '?') {
                i += 1;
                continue;
            }

            let mut end = i + 1;
            while end < chars.len() && Self::closes_sentence(chars[end].1) {
                end += 1;
            }
            if end >= chars.len() || !chars[end].1.is_whitespace() {
                i = end;
                continue;
            }

            let mut next = end;
            while next < chars.len() && chars[next].1.is_whitespace() {
                next += 1;
            }
            let opens = next >= chars.len() || Self::opens_sentence(chars[next].1);
            let abbreviated = c == '.' && Self::is_abbreviation(&text[start..pos]);

            if opens && !abbreviated {
                let sentence = text[start..chars[end].0].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = chars.get(next).map(|(p, _)| *p).unwrap_or(text.len());
            }
            i = next;
        }

        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail);
        }
        Ok(sentences)
    }
}

/// Split after any `.`, `!` or `?` followed by whitespace.
pub fn punctuation_split(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in TERMINAL_PUNCTUATION.find_iter(text) {
        let sentence = text[start..m.start() + 1].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Splits oversized paragraphs into budget-sized sentence groups.
pub struct SentenceSplitter {
    detector: Box<dyn SentenceDetector>,
}

impl SentenceSplitter {
    pub fn new() -> Self {
        Self::with_detector(RuleSentenceDetector)
    }

    pub fn with_detector<D>(detector: D) -> Self
    where
        D: SentenceDetector + 'static,
    {
        Self {
            detector: Box::new(detector),
        }
    }

    /// Sentences of `text`, using the punctuation fallback when the detector
    /// fails or finds no boundary.
    pub fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self.detector.sentences(text) {
            Ok(sentences) if sentences.len() > 1 => sentences,
            Ok(sentences) => {
                let fallback = punctuation_split(text);
                if fallback.len() > sentences.len() {
                    debug!("No sentence boundary detected, using punctuation split");
                    fallback
                } else {
                    sentences
                }
            }
            Err(e) => {
                warn!("Sentence detection failed ({}), using punctuation split", e);
                punctuation_split(text)
            }
        }
    }

    /// Greedily pack sentences into groups of at most `max_tokens`.
    ///
    /// A sentence that alone exceeds the budget becomes its own group.
    pub fn split<'a>(
        &self,
        text: &'a str,
        max_tokens: usize,
        counter: &'a dyn TokenCounter,
    ) -> SentenceGroups<'a> {
        SentenceGroups {
            sentences: self.sentences(text).into_iter(),
            carry: None,
            max_tokens,
            counter,
        }
    }
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy, single-pass sequence of sentence groups joined by spaces.
pub struct SentenceGroups<'a> {
    sentences: std::vec::IntoIter<&'a str>,
    carry: Option<&'a str>,
    max_tokens: usize,
    counter: &'a dyn TokenCounter,
}

impl Iterator for SentenceGroups<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let first = self.carry.take().or_else(|| self.sentences.next())?;
        let mut group = first.to_string();

        for sentence in self.sentences.by_ref() {
            let candidate = format!("{} {}", group, sentence);
            if self.counter.count(&candidate) > self.max_tokens {
                self.carry = Some(sentence);
                break;
            }
            group = candidate;
        }

        Some(group)
    }
}
