//! Error types for the filing chunking pipeline.

use thiserror::Error;

/// Result type alias using TenkError.
pub type Result<T> = std::result::Result<T, TenkError>;

/// Errors that can occur while chunking filings.
#[derive(Error, Debug)]
pub enum TenkError {
    /// Document metadata is unusable.
    #[error("Invalid document {key}: {message}")]
    InvalidDocument { key: String, message: String },

    /// Document carries no recognised section at all.
    #[error("Document {key} has no item1 or item1a section")]
    MissingSections { key: String },

    /// Failed to load a filing from its source.
    #[error("Failed to load filing from {uri}: {reason}")]
    LoadFailed { uri: String, reason: String },

    /// Tokenizer could not be constructed or failed to encode.
    #[error("Tokenizer error: {message}")]
    Tokenizer { message: String },

    /// Sentence boundary detection failed.
    #[error("Sentence split error: {message}")]
    SentenceSplit { message: String },

    /// Checkpoint could not be read or written.
    #[error("Checkpoint error: {message}")]
    Checkpoint { message: String },

    /// Chunk sink rejected a write.
    #[error("Sink error: {message}")]
    Sink { message: String },

    /// Document processing exceeded its time budget.
    #[error("Document {key} timed out after {secs}s")]
    Timeout { key: String, secs: u64 },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TenkError {
    /// Create an invalid document error.
    pub fn invalid_document(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a load failure.
    pub fn load_failed(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Create a tokenizer error.
    pub fn tokenizer(message: impl Into<String>) -> Self {
        Self::Tokenizer {
            message: message.into(),
        }
    }

    /// Create a sentence split error.
    pub fn sentence_split(message: impl Into<String>) -> Self {
        Self::SentenceSplit {
            message: message.into(),
        }
    }

    /// Create a checkpoint error.
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: message.into(),
        }
    }

    /// Create a sink error.
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the error code recorded in batch error logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDocument { .. } => "INVALID_DOCUMENT",
            Self::MissingSections { .. } => "MISSING_SECTIONS",
            Self::LoadFailed { .. } => "LOAD_FAILED",
            Self::Tokenizer { .. } => "TOKENIZER_ERROR",
            Self::SentenceSplit { .. } => "SENTENCE_SPLIT_ERROR",
            Self::Checkpoint { .. } => "CHECKPOINT_ERROR",
            Self::Sink { .. } => "SINK_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
