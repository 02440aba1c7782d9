//! OpenAI provider using the Chat Completions API.
//!
//! Sends the image via data URL in the user message content array and asks
//! for a `json_object` response format.

use super::provider::{body_error, http_error, request_error, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use crate::types::TokenUsage;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

fn build_request(model: &str, request: &LlmRequest) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: vec![
                ChatContent::Text {
                    text: request.prompt.clone(),
                },
                ChatContent::ImageUrl {
                    image_url: ImageUrl {
                        url: request.image.data_url(),
                    },
                },
            ],
        }],
        response_format: ResponseFormat {
            format_type: "json_object".to_string(),
        },
    }
}

fn into_response(chat_resp: ChatResponse, latency_ms: u64) -> Result<LlmResponse, PipelineError> {
    let text = chat_resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PipelineError::Llm {
            message: "OpenAI returned empty choices array, no content generated".to_string(),
            status_code: None,
        })?;

    let usage = chat_resp
        .usage
        .map(|u| TokenUsage {
            prompt: u.prompt_tokens,
            completion: u.completion_tokens,
            total: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        text,
        model: chat_resp.model,
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

    let resp = client
        .post(format!("{endpoint}/chat/completions"))
        .bearer_auth(api_key)
        .json(&build_request(model, request))
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| request_error("OpenAI", e))?;

    if !resp.status().is_success() {
        return Err(http_error("OpenAI", resp).await);
    }

    let chat_resp: ChatResponse = resp
        .json()
        .await
        .map_err(|e| body_error("OpenAI", e))?;

    into_response(chat_resp, start.elapsed().as_millis() as u64)
}
