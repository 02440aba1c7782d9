//! Error types for the Stockmeta annotation pipeline.
//!
//! Errors are organized by stage so that messages carry the context a user
//! needs to act on them (file path, provider, HTTP status, exit code).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Stockmeta operations.
#[derive(Error, Debug)]
pub enum StockmetaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// The selected provider has no usable API key
    #[error("No API key available for provider {provider}")]
    NoApiKeys { provider: String },
}

/// Per-image processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Reading the image from disk failed
    #[error("Failed to read image {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Vision provider call failed
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        /// HTTP status code when the failure came from an HTTP response.
        status_code: Option<u16>,
    },

    /// No HTTP response arrived (connect, send or body read failed, or timed out)
    #[error("{provider} request {what}: {message}")]
    Transport {
        provider: String,
        what: String,
        message: String,
    },

    /// The provider answered but the text was not the expected JSON object
    #[error("Failed to parse {provider} response: {message}. Raw response: {raw}")]
    Parse {
        provider: String,
        message: String,
        raw: String,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// External metadata writer failed
    #[error("Metadata writer failed for {path}: {message}")]
    Writer {
        path: PathBuf,
        message: String,
        exit_code: Option<i32>,
    },
}

/// Convenience type alias for Stockmeta results.
pub type Result<T> = std::result::Result<T, StockmetaError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
