//! Core data types for the Stockmeta annotation pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The vision provider that generates metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini (`generateContent`)
    #[default]
    Gemini,
    /// OpenAI Chat Completions
    OpenAi,
}

impl ProviderKind {
    /// Model names offered for this provider. Any other name is accepted too.
    pub fn known_models(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Gemini => &["gemini-1.5-flash", "gemini-2.0-flash", "gemini-2.5-flash"],
            ProviderKind::OpenAi => &[
                "gpt-4o-mini",
                "gpt-4o",
                "gpt-4-turbo",
                "gpt-4-vision-preview",
            ],
        }
    }

    /// Human-readable provider name used in log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::OpenAi => "OpenAI",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

/// Stock-photography metadata for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMetadata {
    /// Descriptive title (the prompt asks for at most 200 characters)
    pub title: String,

    /// Description (the prompt asks for at most 200 characters)
    pub description: String,

    /// Comma-separated keywords, written to `XMP-dc:Subject`
    pub keywords: String,
}

impl StockMetadata {
    /// Number of non-empty keywords in the comma-separated list.
    pub fn keyword_count(&self) -> usize {
        self.keywords
            .split(',')
            .filter(|k| !k.trim().is_empty())
            .count()
    }
}

/// Token accounting reported by a provider. Zeros when not reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt = self.prompt.saturating_add(other.prompt);
        self.completion = self.completion.saturating_add(other.completion);
        self.total = self.total.saturating_add(other.total);
    }
}

/// Final state of one image in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationStatus {
    /// Metadata generated and written into the file
    Annotated,
    /// Gave up on this image
    Failed,
    /// Interrupted by a stop request
    Cancelled,
}

/// One line of the per-image report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Path of the image file
    pub file_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// Final state
    pub status: AnnotationStatus,

    /// Provider calls made for this image
    pub attempts: u32,

    /// Written metadata (annotated images only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StockMetadata>,

    /// Token usage of the successful call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,

    /// Last error (failed images only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counters for a finished (or stopped) batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Images started, including one interrupted by a stop request
    pub processed: u64,

    /// Images whose metadata was written
    pub succeeded: u64,

    /// Images that were given up on
    pub failed: u64,

    /// True when the batch stopped before the last image
    pub cancelled: bool,

    /// Sum of token usage across successful calls
    pub usage: TokenUsage,

    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::OpenAi).unwrap(),
            "\"openai\""
        );
        assert_eq!(
            serde_json::from_str::<ProviderKind>("\"gemini\"").unwrap(),
            ProviderKind::Gemini
        );
    }

    #[test]
    fn test_known_models_start_with_default() {
        assert_eq!(ProviderKind::Gemini.known_models()[0], "gemini-1.5-flash");
        assert_eq!(ProviderKind::OpenAi.known_models()[0], "gpt-4o-mini");
    }

    #[test]
    fn test_keyword_count_ignores_blanks() {
        let meta = StockMetadata {
            title: "t".to_string(),
            description: "d".to_string(),
            keywords: "sunset, beach, ,ocean,".to_string(),
        };
        assert_eq!(meta.keyword_count(), 3);
    }

    #[test]
    fn test_token_usage_accumulates() {
        let mut total = TokenUsage::default();
        total += TokenUsage {
            prompt: 10,
            completion: 5,
            total: 15,
        };
        total += TokenUsage {
            prompt: 1,
            completion: 2,
            total: 3,
        };
        assert_eq!(total.total, 18);
        assert_eq!(total.prompt, 11);
    }

    #[test]
    fn test_record_skips_empty_fields() {
        let record = AnnotationRecord {
            file_path: PathBuf::from("/a/b.jpg"),
            file_name: "b.jpg".to_string(),
            status: AnnotationStatus::Failed,
            attempts: 5,
            metadata: None,
            usage: None,
            error: Some("boom".to_string()),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(!json.contains("metadata"));
    }
}
