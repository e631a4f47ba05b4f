//! Error types for the ctxbot library.
//!
//! The retrieval pipeline exposes a closed taxonomy through [`RagError`]:
//! a missing knowledge base is fatal at startup, while encoding and generation
//! failures are per-query and recoverable. The external clients (LLM, search,
//! Telegram) each have their own error enum so callers can tell them apart.

use std::path::PathBuf;

/// Errors surfaced by `retrieve` and `answer`.
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("knowledge base is not loaded")]
    IndexUnavailable,

    #[error("failed to encode query: {0}")]
    Encoding(#[from] EncodingError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Errors from the embedding model.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("embedding model failed: {message}")]
    Model { message: String },

    #[error("embedding has dimension {actual}, expected {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("embedding task did not complete: {message}")]
    Task { message: String },
}

/// Errors from the text-generation API.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("no API key configured for the generation service")]
    MissingApiKey,

    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

impl GenerationError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MissingApiKey | Self::MalformedResponse { .. } => false,
        }
    }
}

/// Errors from loading, validating, or writing the index and chunk files.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported index type {fourcc:?} (expected IxF2 or IxFI)")]
    UnsupportedType { fourcc: String },

    #[error("unsupported metric type {metric}")]
    UnsupportedMetric { metric: i32 },

    #[error("index file is truncated")]
    Truncated,

    #[error("index file is corrupt: {message}")]
    Corrupt { message: String },

    #[error("failed to parse chunk file {path}: {source}")]
    ChunkParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("index holds {vectors} vectors but the chunk file holds {chunks} chunks")]
    CountMismatch { vectors: usize, chunks: usize },

    #[error("vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors from the web-search API.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {message}")]
    Transport { message: String },

    #[error("search service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed search response: {message}")]
    MalformedResponse { message: String },
}

/// Errors from the Telegram Bot API.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {message}")]
    Transport { message: String },

    #[error("Telegram API error: {description}")]
    Api { description: String },

    #[error("malformed Telegram response: {message}")]
    MalformedResponse { message: String },
}

/// Errors from reading runtime settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {var} is not set")]
    Missing { var: &'static str },

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid value for {var}: {reason}")]
    Parse { var: String, reason: String },
}
