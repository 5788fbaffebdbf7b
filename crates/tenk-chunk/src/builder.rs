//! Token-bounded chunk assembly with overlap.
//!
//! Paragraphs are fed in source order. Each one is checked against the
//! boundary triggers, first match wins:
//!
//! 1. a header closes the current chunk and becomes the subsection label;
//! 2. a risk opener (item1a) closes a chunk that already meets the minimum;
//! 3. a paragraph that would push the chunk past the budget closes it first;
//! 4. a paragraph larger than the budget is re-fed as sentence groups;
//! 5. anything else is appended.
//!
//! After a chunk is emitted, the last unit it consumed is re-used as the
//! head of the next chunk when it is smaller than twice the overlap bound.
//! A chunk never starts with overlap ahead of a risk opener.
//!
//! A buffer below the minimum is never dropped. At a header it is carried
//! into the next chunk, which takes the new header's label since most of its
//! text follows that header. At the budget it is topped up with the leading
//! sentences of the incoming unit; only when not even one sentence fits is
//! it emitted short.

use tracing::debug;

use tenk_core::{SectionBudget, TokenCounter};

use crate::paragraph::Paragraph;
use crate::sentence::SentenceSplitter;

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SENTENCE_SEPARATOR: &str = " ";

/// Chunk text before identity and metadata are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub text: String,
    pub token_count: usize,
    pub subsection: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushTrigger {
    Header,
    RiskStart,
    Budget,
}

/// Stateful packer for one section. Single-threaded by construction: each
/// chunk's starting state depends on the previous one.
pub struct ChunkBuilder<'a> {
    budget: SectionBudget,
    counter: &'a dyn TokenCounter,
    splitter: &'a SentenceSplitter,
    detect_risk_starts: bool,

    buffer: String,
    buffer_tokens: usize,
    subsection: Option<String>,
    last_unit: Option<String>,
    seed: Option<String>,
    chunks: Vec<RawChunk>,
}

impl<'a> ChunkBuilder<'a> {
    pub fn new(
        budget: SectionBudget,
        counter: &'a dyn TokenCounter,
        splitter: &'a SentenceSplitter,
        detect_risk_starts: bool,
    ) -> Self {
        Self {
            budget,
            counter,
            splitter,
            detect_risk_starts,
            buffer: String::new(),
            buffer_tokens: 0,
            subsection: None,
            last_unit: None,
            seed: None,
            chunks: Vec::new(),
        }
    }

    /// Build all chunks for an ordered paragraph sequence.
    pub fn build(mut self, paragraphs: &[Paragraph]) -> Vec<RawChunk> {
        for paragraph in paragraphs {
            self.push(paragraph);
        }
        self.finish()
    }

    /// Feed the next paragraph.
    pub fn push(&mut self, paragraph: &Paragraph) {
        if paragraph.is_header {
            if !self.buffer.is_empty() {
                self.flush(FlushTrigger::Header);
            }
            self.subsection = Some(paragraph.text.clone());
            return;
        }

        let opens_risk = self.detect_risk_starts && paragraph.is_risk_start;
        if opens_risk
            && !self.buffer.is_empty()
            && self.buffer_tokens >= self.budget.min_chunk_tokens
        {
            self.flush(FlushTrigger::RiskStart);
        }

        if paragraph.tokens > self.budget.max_tokens {
            debug!(
                "Paragraph of {} tokens exceeds budget {}, splitting by sentence",
                paragraph.tokens, self.budget.max_tokens
            );
            let splitter = self.splitter;
            let counter = self.counter;
            let groups = splitter.split(&paragraph.text, self.budget.max_tokens, counter);
            for (i, group) in groups.enumerate() {
                if i == 0 {
                    self.push_unit(group, PARAGRAPH_SEPARATOR, opens_risk);
                } else {
                    self.push_unit(group, SENTENCE_SEPARATOR, false);
                }
            }
        } else {
            self.push_unit(paragraph.text.clone(), PARAGRAPH_SEPARATOR, opens_risk);
        }
    }

    /// Flush the remainder and return chunks in emission order.
    ///
    /// The last chunk is emitted even when it is under the minimum.
    pub fn finish(mut self) -> Vec<RawChunk> {
        if !self.buffer.is_empty() {
            self.emit();
        }
        self.chunks
    }

    fn push_unit(&mut self, mut unit: String, separator: &str, opens_risk: bool) {
        if !self.buffer.is_empty() {
            let candidate = join(&self.buffer, separator, &unit);
            let tokens = self.counter.count(&candidate);
            if tokens <= self.budget.max_tokens {
                self.buffer = candidate;
                self.buffer_tokens = tokens;
                self.last_unit = Some(unit);
                return;
            }

            if self.buffer_tokens < self.budget.min_chunk_tokens {
                match self.top_up(&unit, separator) {
                    Some(rest) if rest.is_empty() => return,
                    Some(rest) => unit = rest,
                    None => debug!(
                        "Emitting {}-token chunk below minimum {}, next unit is indivisible",
                        self.buffer_tokens, self.budget.min_chunk_tokens
                    ),
                }
            }
            self.flush(FlushTrigger::Budget);
        }

        if let Some(seed) = self.seed.take() {
            if !opens_risk {
                let seeded = join(&seed, PARAGRAPH_SEPARATOR, &unit);
                let tokens = self.counter.count(&seeded);
                if tokens <= self.budget.max_tokens {
                    self.buffer = seeded;
                    self.buffer_tokens = tokens;
                    self.last_unit = Some(unit);
                    return;
                }
            }
        }

        self.buffer_tokens = self.counter.count(&unit);
        self.buffer = unit.clone();
        self.last_unit = Some(unit);
    }

    /// Move leading sentences of `unit` into the buffer while they fit.
    ///
    /// Returns the unconsumed remainder, or `None` when not even the first
    /// sentence fits.
    fn top_up(&mut self, unit: &str, separator: &str) -> Option<String> {
        let sentences = self.splitter.sentences(unit);
        let mut filled = self.buffer.clone();
        let mut filled_tokens = self.buffer_tokens;
        let mut joiner = separator;
        let mut taken = 0;

        for sentence in &sentences {
            let candidate = join(&filled, joiner, sentence);
            let tokens = self.counter.count(&candidate);
            if tokens > self.budget.max_tokens {
                break;
            }
            filled = candidate;
            filled_tokens = tokens;
            joiner = SENTENCE_SEPARATOR;
            taken += 1;
        }

        if taken == 0 {
            return None;
        }
        debug!(
            "Topped up short buffer with {} of {} sentences",
            taken,
            sentences.len()
        );
        self.buffer = filled;
        self.buffer_tokens = filled_tokens;
        // The remainder continues this unit; no overlap is needed.
        self.last_unit = None;
        Some(sentences[taken..].join(SENTENCE_SEPARATOR))
    }

    fn flush(&mut self, trigger: FlushTrigger) {
        if self.buffer.is_empty() {
            return;
        }

        if self.buffer_tokens < self.budget.min_chunk_tokens && trigger != FlushTrigger::Budget {
            debug!(
                "Carrying {}-token buffer forward past {:?} boundary",
                self.buffer_tokens, trigger
            );
            return;
        }
        self.emit();

        let overlap_limit = self.budget.overlap_tokens.saturating_mul(2);
        self.seed = self
            .last_unit
            .take()
            .filter(|unit| self.counter.count(unit) < overlap_limit);
    }

    fn emit(&mut self) {
        let text = std::mem::take(&mut self.buffer);
        self.chunks.push(RawChunk {
            text,
            token_count: self.buffer_tokens,
            subsection: self.subsection.clone(),
        });
        self.buffer_tokens = 0;
    }
}

fn join(head: &str, separator: &str, tail: &str) -> String {
    let mut joined = String::with_capacity(head.len() + separator.len() + tail.len());
    joined.push_str(head);
    joined.push_str(separator);
    joined.push_str(tail);
    joined
}
