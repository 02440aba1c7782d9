//! Vision provider request/response types and the Gemini/OpenAI dispatch.
//!
//! Both providers receive the same image and prompt and answer with free text
//! that should contain the metadata JSON object.

use crate::config::LlmConfig;
use crate::error::PipelineError;
use crate::types::{ProviderKind, TokenUsage};
use base64::Engine;
use std::path::Path;
use std::time::Duration;

/// Prompt sent with every image.
pub const STOCK_METADATA_PROMPT: &str = "Analyze this image for stock photography metadata. \
     Provide a highly descriptive title (max 200 characters), a comprehensive description \
     (max 200 characters), and exactly 49 relevant, comma-separated keywords (focus on \
     specific nouns, action verbs, vivid adjectives, and relevant concepts). Format the \
     output as a JSON object with keys: 'title', 'description', 'keywords'.";

/// Base64-encoded image ready to send to a provider.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/tiff")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes, deriving the MIME type from the path.
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type_for(path).to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// MIME type for an image path, by extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "psd" => "image/vnd.adobe.photoshop",
        _ => "application/octet-stream",
    }
}

/// A request to generate stock metadata for one image.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The image to describe
    pub image: ImageInput,
    /// Text prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    /// Build the stock-metadata request for an image.
    pub fn stock_metadata(image: ImageInput) -> Self {
        Self {
            image,
            prompt: STOCK_METADATA_PROMPT.to_string(),
            max_tokens: 1024,
            temperature: 0.4,
        }
    }
}

/// The response from a provider call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text (trimmed)
    pub text: String,
    /// Model identifier reported by the provider
    pub model: String,
    /// Token usage, zeros when not reported
    pub usage: TokenUsage,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
    } else if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}

/// A configured vision provider.
///
/// The two backends share one HTTP client and are selected by `kind`; the
/// API key is passed per call so the key ring can rotate between attempts.
#[derive(Debug, Clone)]
pub struct Provider {
    kind: ProviderKind,
    model: String,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl Provider {
    pub fn new(kind: ProviderKind, model: &str, endpoint: &str, timeout: Duration) -> Self {
        Self {
            kind,
            model: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Create a provider from config, with an optional model override.
    pub fn from_config(
        kind: ProviderKind,
        config: &LlmConfig,
        model_override: Option<&str>,
        timeout: Duration,
    ) -> Self {
        let (endpoint, model) = match kind {
            ProviderKind::Gemini => (&config.gemini.endpoint, &config.gemini.model),
            ProviderKind::OpenAi => (&config.openai.endpoint, &config.openai.model),
        };
        let model = model_override.unwrap_or(model);
        if !kind.known_models().contains(&model) {
            tracing::warn!(
                "Model '{model}' is not in the known {} list ({}); using it anyway",
                kind.display_name(),
                kind.known_models().join(", ")
            );
        }
        Self::new(kind, model, endpoint, timeout)
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the image and prompt to the selected backend using `api_key`.
    pub async fn generate(
        &self,
        api_key: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, PipelineError> {
        match self.kind {
            ProviderKind::Gemini => {
                super::gemini::generate(
                    &self.client,
                    &self.endpoint,
                    &self.model,
                    api_key,
                    request,
                    self.timeout,
                )
                .await
            }
            ProviderKind::OpenAi => {
                super::openai::generate(
                    &self.client,
                    &self.endpoint,
                    &self.model,
                    api_key,
                    request,
                    self.timeout,
                )
                .await
            }
        }
    }
}

/// Turn a non-success HTTP response into a `PipelineError::Llm`.
pub(crate) async fn http_error(provider: &str, resp: reqwest::Response) -> PipelineError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    PipelineError::Llm {
        message: format!("{provider} HTTP {status}: {}", text.trim()),
        status_code: Some(status.as_u16()),
    }
}

/// Turn a transport failure into a `PipelineError::Transport`.
///
/// The URL is stripped because Gemini carries the key in the query string.
pub(crate) fn request_error(provider: &str, e: reqwest::Error) -> PipelineError {
    let what = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "could not connect"
    } else {
        "failed"
    };
    PipelineError::Transport {
        provider: provider.to_string(),
        what: what.to_string(),
        message: e.without_url().to_string(),
    }
}

/// Map an error from reading a success body. Malformed JSON is an `Llm`
/// error; a body cut off mid-read is a transport failure.
pub(crate) fn body_error(provider: &str, e: reqwest::Error) -> PipelineError {
    if e.is_decode() {
        PipelineError::Llm {
            message: format!("Failed to decode {provider} response: {}", e.without_url()),
            status_code: None,
        }
    } else {
        request_error(provider, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_by_extension() {
        assert_eq!(media_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("a.png")), "image/png");
        assert_eq!(media_type_for(Path::new("a.tif")), "image/tiff");
        assert_eq!(media_type_for(Path::new("a.tiff")), "image/tiff");
        assert_eq!(
            media_type_for(Path::new("a.psd")),
            "image/vnd.adobe.photoshop"
        );
        assert_eq!(
            media_type_for(Path::new("a.heic")),
            "application/octet-stream"
        );
        assert_eq!(media_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_image_input_data_url() {
        let input = ImageInput::from_bytes(&[1, 2, 3], Path::new("x.png"));
        assert_eq!(input.media_type, "image/png");
        assert_eq!(input.data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_stock_metadata_prompt() {
        let image = ImageInput::from_bytes(&[1, 2, 3], Path::new("x.jpg"));
        let request = LlmRequest::stock_metadata(image);
        assert!(request.prompt.contains("exactly 49"));
        assert!(request.prompt.contains("'title', 'description', 'keywords'"));
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        assert_eq!(resolve_env_var("   "), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }

    #[test]
    fn test_from_config_uses_override() {
        let config = LlmConfig::default();
        let provider = Provider::from_config(
            ProviderKind::OpenAi,
            &config,
            Some("gpt-4o"),
            Duration::from_secs(5),
        );
        assert_eq!(provider.model(), "gpt-4o");
        assert_eq!(provider.kind(), ProviderKind::OpenAi);

        let provider =
            Provider::from_config(ProviderKind::Gemini, &config, None, Duration::from_secs(5));
        assert_eq!(provider.model(), "gemini-1.5-flash");
    }

    /// Accepts each connection, reads the start of the request, then hangs up.
    async fn hang_up_server() -> String {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
            }
        });
        format!("http://{addr}")
    }

    fn tiny_request() -> LlmRequest {
        LlmRequest::stock_metadata(ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], Path::new("a.jpg")))
    }

    #[tokio::test]
    async fn test_dropped_connection_is_transient() {
        let endpoint = hang_up_server().await;
        for kind in [ProviderKind::Gemini, ProviderKind::OpenAi] {
            let provider = Provider::new(kind, "some-model", &endpoint, Duration::from_secs(5));
            let err = provider
                .generate("AIzaSecretKey", &tiny_request())
                .await
                .unwrap_err();
            assert!(
                matches!(err, PipelineError::Transport { .. }),
                "unexpected error: {err}"
            );
            assert_eq!(
                crate::llm::retry::classify(&err),
                crate::llm::retry::ErrorClass::Transient
            );
            assert!(!err.to_string().contains("AIzaSecretKey"));
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let provider = Provider::new(
            ProviderKind::Gemini,
            "some-model",
            &endpoint,
            Duration::from_secs(5),
        );
        let err = provider.generate("AIzaKey", &tiny_request()).await.unwrap_err();
        assert_eq!(
            crate::llm::retry::classify(&err),
            crate::llm::retry::ErrorClass::Transient
        );
    }
}
