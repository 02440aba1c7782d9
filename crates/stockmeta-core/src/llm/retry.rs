//! Classification of provider failures and exponential backoff.

use crate::error::PipelineError;
use std::time::Duration;

/// What the annotation loop should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Quota or rate limit hit: rotate key, back off exponentially.
    RateLimited,
    /// Key rejected: rotate key, wait the base delay.
    AuthFailed,
    /// Timeout, 5xx, connection failure: same key, back off exponentially.
    Transient,
    /// The selected model is unknown or retired. Give up on the image.
    ModelUnavailable,
    /// Anything else. Give up on the image.
    Fatal,
}

impl ErrorClass {
    /// Whether another attempt can succeed.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorClass::RateLimited | ErrorClass::AuthFailed | ErrorClass::Transient
        )
    }

    /// Whether the current key should be rotated out before the next attempt.
    pub fn rotates_key(self) -> bool {
        matches!(self, ErrorClass::RateLimited | ErrorClass::AuthFailed)
    }
}

const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "quota",
    "resource exhausted",
    "resource_exhausted",
    "too many requests",
];

const AUTH_MARKERS: &[&str] = &[
    "invalid api key",
    "invalid_api_key",
    "api key not valid",
    "incorrect api key",
    "bad api key",
    "api key expired",
    "api_key_invalid",
    "authentication",
];

const MODEL_MARKERS: &[&str] = &[
    "deprecated",
    "model_not_found",
    "invalid model",
    "model not found",
    "does not exist",
];

/// Classify a pipeline error.
///
/// HTTP status codes are checked first; the message markers cover errors
/// that carry no status (or a generic 400 with a descriptive body, which is
/// how Gemini reports a bad or expired key). Transport failures never have a
/// response to inspect and are always transient.
pub fn classify(error: &PipelineError) -> ErrorClass {
    match error {
        PipelineError::Timeout { .. } | PipelineError::Transport { .. } => ErrorClass::Transient,
        PipelineError::Llm {
            status_code,
            message,
        } => {
            match status_code {
                Some(429) => return ErrorClass::RateLimited,
                Some(401) | Some(403) => return ErrorClass::AuthFailed,
                Some(404) => return ErrorClass::ModelUnavailable,
                Some(code) if (500..=599).contains(code) => return ErrorClass::Transient,
                _ => {}
            }

            let lower = message.to_lowercase();
            if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
                ErrorClass::RateLimited
            } else if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
                ErrorClass::AuthFailed
            } else if MODEL_MARKERS.iter().any(|m| lower.contains(m)) {
                ErrorClass::ModelUnavailable
            } else {
                ErrorClass::Fatal
            }
        }
        _ => ErrorClass::Fatal,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 60 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(60_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn llm(status_code: Option<u16>, message: &str) -> PipelineError {
        PipelineError::Llm {
            message: message.to_string(),
            status_code,
        }
    }

    #[test]
    fn test_rate_limit_by_status() {
        assert_eq!(classify(&llm(Some(429), "slow down")), ErrorClass::RateLimited);
    }

    #[test]
    fn test_rate_limit_by_message() {
        let err = llm(
            Some(400),
            "Gemini HTTP 400: RESOURCE_EXHAUSTED: Quota exceeded for metric",
        );
        assert_eq!(classify(&err), ErrorClass::RateLimited);
        assert_eq!(
            classify(&llm(None, "Too Many Requests")),
            ErrorClass::RateLimited
        );
    }

    #[test]
    fn test_auth_failures() {
        assert_eq!(classify(&llm(Some(401), "unauthorized")), ErrorClass::AuthFailed);
        assert_eq!(classify(&llm(Some(403), "forbidden")), ErrorClass::AuthFailed);
        let gemini_bad_key = llm(
            Some(400),
            "Gemini HTTP 400: API key not valid. Please pass a valid API key.",
        );
        assert_eq!(classify(&gemini_bad_key), ErrorClass::AuthFailed);
        let gemini_expired = llm(
            Some(400),
            r#"Gemini HTTP 400 Bad Request: {"error": {"code": 400, "message": "API key expired. Please renew the API key.", "status": "INVALID_ARGUMENT", "details": [{"reason": "API_KEY_INVALID"}]}}"#,
        );
        assert_eq!(classify(&gemini_expired), ErrorClass::AuthFailed);
        assert!(classify(&gemini_expired).rotates_key());
    }

    #[test]
    fn test_model_unavailable() {
        assert_eq!(
            classify(&llm(Some(404), "models/gemini-9 is not found")),
            ErrorClass::ModelUnavailable
        );
        assert_eq!(
            classify(&llm(Some(400), "The model `gpt-4-vision-preview` has been deprecated")),
            ErrorClass::ModelUnavailable
        );
        assert!(!ErrorClass::ModelUnavailable.is_retryable());
    }

    #[test]
    fn test_server_error_and_timeout_are_transient() {
        assert_eq!(classify(&llm(Some(503), "unavailable")), ErrorClass::Transient);
        let err = PipelineError::Timeout {
            path: PathBuf::from("a.jpg"),
            stage: "llm".to_string(),
            timeout_ms: 60000,
        };
        assert_eq!(classify(&err), ErrorClass::Transient);
    }

    #[test]
    fn test_transport_failures_are_transient() {
        for what in ["failed", "could not connect", "timed out"] {
            let err = PipelineError::Transport {
                provider: "Gemini".to_string(),
                what: what.to_string(),
                message: "error sending request".to_string(),
            };
            assert_eq!(classify(&err), ErrorClass::Transient);
        }
    }

    #[test]
    fn test_connect_text_without_transport_is_fatal() {
        let err = llm(None, "Gemini returned no text (finish reason: connect)");
        assert_eq!(classify(&err), ErrorClass::Fatal);
    }

    #[test]
    fn test_message_with_500_in_body_is_fatal_without_status() {
        let err = llm(None, "Processed 500 tokens successfully");
        assert_eq!(classify(&err), ErrorClass::Fatal);
    }

    #[test]
    fn test_parse_and_writer_errors_are_fatal() {
        let parse = PipelineError::Parse {
            provider: "Gemini".to_string(),
            message: "expected value".to_string(),
            raw: "not json".to_string(),
        };
        assert_eq!(classify(&parse), ErrorClass::Fatal);

        let writer = PipelineError::Writer {
            path: PathBuf::from("a.jpg"),
            message: "quota exceeded on disk".to_string(),
            exit_code: Some(1),
        };
        assert_eq!(classify(&writer), ErrorClass::Fatal);
    }

    #[test]
    fn test_key_rotation_classes() {
        assert!(ErrorClass::RateLimited.rotates_key());
        assert!(ErrorClass::AuthFailed.rotates_key());
        assert!(!ErrorClass::Transient.rotates_key());
        assert!(ErrorClass::Transient.is_retryable());
        assert!(!ErrorClass::Fatal.is_retryable());
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 2000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(1, 2000), Duration::from_millis(4000));
        assert_eq!(backoff_duration(2, 2000), Duration::from_millis(8000));
        assert_eq!(backoff_duration(3, 2000), Duration::from_millis(16000));
    }

    #[test]
    fn test_backoff_capped() {
        assert_eq!(backoff_duration(10, 2000), Duration::from_millis(60_000));
        assert_eq!(backoff_duration(u32::MAX, u64::MAX), Duration::from_millis(60_000));
    }
}
