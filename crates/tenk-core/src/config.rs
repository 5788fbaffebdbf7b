//! Configuration types for the chunking pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, TenkError};
use crate::traits::SectionBudget;
use crate::types::SectionKey;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenkConfig {
    /// Chunking configuration.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Batch configuration.
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Which token counter backs all budget comparisons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCounterStrategy {
    /// `chars / 4`, rounded down.
    #[default]
    Approximate,
    /// Subword tokenizer count.
    Exact,
}

/// Chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Token budget for item1 (business) chunks.
    #[serde(default = "default_max_tokens_item1")]
    pub max_tokens_item1: usize,

    /// Token budget for item1a (risk factor) chunks.
    #[serde(default = "default_max_tokens_item1a")]
    pub max_tokens_item1a: usize,

    /// Overlap bound between consecutive chunks.
    #[serde(default = "default_overlap_tokens")]
    pub overlap_tokens: usize,

    /// Minimum tokens for a non-terminal chunk.
    #[serde(default = "default_min_chunk_tokens")]
    pub min_chunk_tokens: usize,

    /// Paragraphs shorter than this are dropped as noise.
    #[serde(default = "default_min_paragraph_chars")]
    pub min_paragraph_chars: usize,

    /// Sections shorter than this are marked unavailable.
    #[serde(default = "default_min_section_chars")]
    pub min_section_chars: usize,

    #[serde(default)]
    pub token_counter_strategy: TokenCounterStrategy,

    /// HuggingFace tokenizer.json for the exact strategy.
    /// Uses cl100k_base when unset.
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens_item1: 1200,
            max_tokens_item1a: 800,
            overlap_tokens: 100,
            min_chunk_tokens: 200,
            min_paragraph_chars: 50,
            min_section_chars: 500,
            token_counter_strategy: TokenCounterStrategy::Approximate,
            tokenizer_path: None,
        }
    }
}

impl ChunkingConfig {
    /// Token budget for a section.
    pub fn budget_for(&self, section: SectionKey) -> SectionBudget {
        let max_tokens = match section {
            SectionKey::Item1 => self.max_tokens_item1,
            SectionKey::Item1a => self.max_tokens_item1a,
        };
        SectionBudget {
            max_tokens,
            min_chunk_tokens: self.min_chunk_tokens,
            overlap_tokens: self.overlap_tokens,
        }
    }
}

/// Batch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory of extracted filing JSON files.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// JSON-lines output file.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Written only when some documents failed.
    #[serde(default = "default_error_log_path")]
    pub error_log_path: PathBuf,

    /// Documents between checkpoint saves.
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,

    /// Documents chunked concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Abort a single document after this many seconds.
    #[serde(default)]
    pub document_timeout_secs: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_path: default_output_path(),
            checkpoint_path: default_checkpoint_path(),
            error_log_path: default_error_log_path(),
            checkpoint_interval: 10,
            workers: 4,
            document_timeout_secs: None,
        }
    }
}

// Default value functions

fn default_max_tokens_item1() -> usize {
    1200
}

fn default_max_tokens_item1a() -> usize {
    800
}

fn default_overlap_tokens() -> usize {
    100
}

fn default_min_chunk_tokens() -> usize {
    200
}

fn default_min_paragraph_chars() -> usize {
    50
}

fn default_min_section_chars() -> usize {
    500
}

fn default_checkpoint_interval() -> usize {
    10
}

fn default_workers() -> usize {
    4
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tenk-rag")
}

fn default_input_dir() -> PathBuf {
    data_dir().join("extracted_10k")
}

fn default_output_path() -> PathBuf {
    data_dir().join("10k_chunks.jsonl")
}

fn default_checkpoint_path() -> PathBuf {
    data_dir().join("chunking_checkpoint.json")
}

fn default_error_log_path() -> PathBuf {
    data_dir().join("_chunking_errors.json")
}

impl TenkConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| TenkError::config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tenk-rag").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        let local_config = PathBuf::from("tenk.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }

    /// Check option consistency once at startup.
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.max_tokens_item1 == 0 || c.max_tokens_item1a == 0 {
            return Err(TenkError::config("max_tokens_* must be positive"));
        }
        if c.min_chunk_tokens > c.max_tokens_item1 || c.min_chunk_tokens > c.max_tokens_item1a {
            return Err(TenkError::config(format!(
                "min_chunk_tokens ({}) exceeds a section budget",
                c.min_chunk_tokens
            )));
        }
        if self.batch.checkpoint_interval == 0 {
            return Err(TenkError::config("checkpoint_interval must be positive"));
        }
        if self.batch.workers == 0 {
            return Err(TenkError::config("workers must be positive"));
        }
        Ok(())
    }
}
