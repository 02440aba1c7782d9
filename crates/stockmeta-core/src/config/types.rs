//! Sub-configuration structs with their defaults.

use crate::types::ProviderKind;
use serde::{Deserialize, Serialize};

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input formats (file extensions, case-insensitive)
    pub supported_formats: Vec<String>,

    /// Pause between two images in milliseconds
    pub inter_image_delay_ms: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "tif".to_string(),
                "tiff".to_string(),
                "psd".to_string(),
            ],
            inter_image_delay_ms: 1000,
        }
    }
}

/// Retry settings for provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum provider calls per image
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds (doubled per rate-limited attempt)
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2000,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// LLM call timeout in milliseconds
    pub llm_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            llm_timeout_ms: 60000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Vision provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider used when `--provider` is not given
    pub provider: ProviderKind,

    /// Google Gemini configuration
    pub gemini: GeminiConfig,

    /// OpenAI configuration
    pub openai: OpenAiConfig,
}

/// Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API base URL (without the `/models/...` suffix)
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// API keys, tried in order (each supports ${ENV_VAR} syntax)
    pub api_keys: Vec<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_keys: vec!["${GEMINI_API_KEY}".to_string()],
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL (without the `/chat/completions` suffix)
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// API keys, tried in order (each supports ${ENV_VAR} syntax)
    pub api_keys: Vec<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_keys: vec!["${OPENAI_API_KEY}".to_string()],
        }
    }
}

/// ExifTool invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifToolConfig {
    /// Program to run
    pub program: String,

    /// Run ExifTool inside WSL (`wsl exiftool ...`) and translate Windows
    /// drive paths to `/mnt/<drive>/...`.
    pub wsl: bool,

    /// Extra arguments inserted before the tag assignments
    pub extra_args: Vec<String>,
}

impl Default for ExifToolConfig {
    fn default() -> Self {
        Self {
            program: "exiftool".to_string(),
            wsl: false,
            extra_args: Vec::new(),
        }
    }
}
