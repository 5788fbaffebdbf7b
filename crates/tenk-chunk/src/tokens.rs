//! Token counting strategies.
//!
//! All budget comparisons go through a [`TokenCounter`]; which one is active
//! is decided once at startup by [`build_token_counter`].

use std::path::Path;
use std::sync::Arc;

use tiktoken_rs::{cl100k_base, CoreBPE};
use tokenizers::Tokenizer;
use tracing::{info, warn};

use tenk_core::{ChunkingConfig, Result, TenkError, TokenCounter, TokenCounterStrategy};

/// Character-based estimate: one token per four characters, rounded down.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateCounter;

impl TokenCounter for ApproximateCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count() / 4
    }

    fn name(&self) -> &'static str {
        "approximate"
    }
}

/// Exact counts with the cl100k_base BPE.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn cl100k() -> Result<Self> {
        let bpe = cl100k_base()
            .map_err(|e| TenkError::tokenizer(format!("Failed to load cl100k_base: {}", e)))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn name(&self) -> &'static str {
        "cl100k_base"
    }
}

/// Exact counts with a HuggingFace tokenizer.json.
///
/// Encoding failures fall back to the approximate count for that text.
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
}

impl HfTokenCounter {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            TenkError::tokenizer(format!("Failed to load tokenizer {:?}: {}", path, e))
        })?;
        Ok(Self { tokenizer })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                warn!("Tokenization failed ({}), using approximate count", e);
                ApproximateCounter.count(text)
            }
        }
    }

    fn name(&self) -> &'static str {
        "huggingface"
    }
}

/// Construct the exact counter named by the config.
pub fn exact_counter(config: &ChunkingConfig) -> Result<Arc<dyn TokenCounter>> {
    match &config.tokenizer_path {
        Some(path) => Ok(Arc::new(HfTokenCounter::from_file(path)?)),
        None => Ok(Arc::new(TiktokenCounter::cl100k()?)),
    }
}

/// Construct the configured counter, degrading to approximate counts when
/// the exact tokenizer is unavailable.
pub fn build_token_counter(config: &ChunkingConfig) -> Arc<dyn TokenCounter> {
    let counter: Arc<dyn TokenCounter> = match config.token_counter_strategy {
        TokenCounterStrategy::Approximate => Arc::new(ApproximateCounter),
        TokenCounterStrategy::Exact => match exact_counter(config) {
            Ok(counter) => counter,
            Err(e) => {
                warn!("{}; falling back to approximate token counts", e);
                Arc::new(ApproximateCounter)
            }
        },
    };
    info!("Token counter: {}", counter.name());
    counter
}
