//! Turn provider text into `StockMetadata`.

use crate::error::PipelineError;
use crate::types::StockMetadata;
use serde::Deserialize;

const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_DESCRIPTION: &str = "No description available.";

#[derive(Deserialize)]
struct RawMetadata {
    title: Option<String>,
    description: Option<String>,
    keywords: Option<Keywords>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Keywords {
    Text(String),
    List(Vec<String>),
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest.trim_start();
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest.trim_end();
    }
    s
}

/// Parse a provider response into metadata, filling defaults for missing keys.
pub fn parse_metadata(provider: &str, text: &str) -> Result<StockMetadata, PipelineError> {
    let body = strip_code_fence(text);
    let raw: RawMetadata = serde_json::from_str(body).map_err(|e| PipelineError::Parse {
        provider: provider.to_string(),
        message: e.to_string(),
        raw: text.to_string(),
    })?;

    let keywords = match raw.keywords {
        Some(Keywords::Text(text)) => text.trim().to_string(),
        Some(Keywords::List(list)) => list
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        None => String::new(),
    };

    Ok(StockMetadata {
        title: non_empty_or(raw.title, DEFAULT_TITLE),
        description: non_empty_or(raw.description, DEFAULT_DESCRIPTION),
        keywords,
    })
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let meta = parse_metadata(
            "Gemini",
            r#"{"title": "Red kayak on a lake", "description": "Calm morning.", "keywords": "kayak, lake, red"}"#,
        )
        .unwrap();
        assert_eq!(meta.title, "Red kayak on a lake");
        assert_eq!(meta.description, "Calm morning.");
        assert_eq!(meta.keywords, "kayak, lake, red");
    }

    #[test]
    fn test_fenced_json() {
        let text = "```json\n{\"title\": \"A\", \"description\": \"B\", \"keywords\": \"c\"}\n```";
        let meta = parse_metadata("Gemini", text).unwrap();
        assert_eq!(meta.title, "A");

        let bare = "```\n{\"title\": \"A\"}\n```";
        assert_eq!(parse_metadata("OpenAI", bare).unwrap().title, "A");
    }

    #[test]
    fn test_keyword_array_is_joined() {
        let meta = parse_metadata(
            "OpenAI",
            r#"{"title": "t", "description": "d", "keywords": ["sun", " sea ", ""]}"#,
        )
        .unwrap();
        assert_eq!(meta.keywords, "sun, sea");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let meta = parse_metadata("Gemini", "{}").unwrap();
        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.description, "No description available.");
        assert_eq!(meta.keywords, "");
    }

    #[test]
    fn test_invalid_json_keeps_raw_text() {
        let err = parse_metadata("Gemini", "Sure! Here is your metadata").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Gemini"));
        assert!(msg.contains("Sure! Here is your metadata"));
    }
}
