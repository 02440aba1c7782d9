//! Google Gemini provider using the `generateContent` REST API.
//!
//! Sends the image as an `inlineData` part next to the text prompt and asks
//! for a JSON response body.

use super::provider::{body_error, http_error, request_error, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use crate::types::TokenUsage;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    response_mime_type: String,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn build_request(request: &LlmRequest) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![
                Part::Inline {
                    inline_data: InlineData {
                        mime_type: request.image.media_type.clone(),
                        data: request.image.data.clone(),
                    },
                },
                Part::Text {
                    text: request.prompt.clone(),
                },
            ],
        }],
        generation_config: GenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
            response_mime_type: "application/json".to_string(),
        },
    }
}

/// Extract text and usage from a decoded response body.
fn into_response(
    body: GenerateResponse,
    model: &str,
    latency_ms: u64,
) -> Result<LlmResponse, PipelineError> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(PipelineError::Llm {
            message: format!("Gemini blocked the request: {reason}"),
            status_code: None,
        });
    }

    let candidate = body.candidates.into_iter().next();
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let text = candidate
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(PipelineError::Llm {
            message: format!(
                "Gemini returned no text (finish reason: {})",
                finish_reason.as_deref().unwrap_or("unknown")
            ),
            status_code: None,
        });
    }

    let usage = body
        .usage_metadata
        .map(|u| TokenUsage {
            prompt: u.prompt_token_count,
            completion: u.candidates_token_count,
            total: u.total_token_count,
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        text,
        model: body.model_version.unwrap_or_else(|| model.to_string()),
        usage,
        latency_ms,
    })
}

pub(crate) async fn generate(
    client: &reqwest::Client,
    endpoint: &str,
    model: &str,
    api_key: &str,
    request: &LlmRequest,
    timeout: Duration,
) -> Result<LlmResponse, PipelineError> {
    let start = Instant::now();
    let url = format!("{endpoint}/models/{model}:generateContent");

    let resp = client
        .post(&url)
        .query(&[("key", api_key)])
        .json(&build_request(request))
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| request_error("Gemini", e))?;

    if !resp.status().is_success() {
        return Err(http_error("Gemini", resp).await);
    }

    let body: GenerateResponse = resp
        .json()
        .await
        .map_err(|e| body_error("Gemini", e))?;

    into_response(body, model, start.elapsed().as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ImageInput;
    use std::path::Path;

    fn request() -> LlmRequest {
        LlmRequest::stock_metadata(ImageInput::from_bytes(&[1, 2, 3], Path::new("a.jpg")))
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(build_request(&request())).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "AQID");
        assert!(parts[1]["text"].as_str().unwrap().contains("stock photography"));
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_parse_text_and_usage() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"parts": [{"text": "{\"title\": "}, {"text": "\"Beach\"}\n"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 300, "candidatesTokenCount": 120, "totalTokenCount": 420},
                "modelVersion": "gemini-1.5-flash-002"
            }"#,
        )
        .unwrap();

        let resp = into_response(body, "gemini-1.5-flash", 12).unwrap();
        assert_eq!(resp.text, "{\"title\": \"Beach\"}");
        assert_eq!(resp.model, "gemini-1.5-flash-002");
        assert_eq!(resp.usage.total, 420);
        assert_eq!(resp.usage.completion, 120);
    }

    #[test]
    fn test_missing_usage_is_zero() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{}"}]}}]}"#,
        )
        .unwrap();
        let resp = into_response(body, "gemini-2.0-flash", 1).unwrap();
        assert_eq!(resp.usage, TokenUsage::default());
        assert_eq!(resp.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_empty_candidates_is_error() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        let err = into_response(body, "m", 1).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "OTHER"}}"#).unwrap();
        let err = into_response(body, "m", 1).unwrap_err();
        assert!(err.to_string().contains("blocked"));
    }
}
