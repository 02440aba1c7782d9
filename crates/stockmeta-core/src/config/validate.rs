//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".into(),
            ));
        }
        if self.retry.base_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "retry.base_delay_ms must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.llm.gemini.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.gemini.model must not be empty".into(),
            ));
        }
        if self.llm.openai.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.openai.model must not be empty".into(),
            ));
        }
        if self.exiftool.program.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "exiftool.program must not be empty".into(),
            ));
        }
        Ok(())
    }
}
