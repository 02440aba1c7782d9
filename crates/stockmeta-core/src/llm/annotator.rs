//! Per-image retry/failover loop.
//!
//! One image goes through: load → provider call (current key, bounded by a
//! timeout) → parse → write. Failures are classified; rate limits and bad
//! keys rotate to the next key, rate limits and transient errors back off
//! exponentially, and anything else ends the image. Backoff sleeps wake up
//! early when the batch is cancelled.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::keys::{mask_key, KeyRing};
use super::parse::parse_metadata;
use super::provider::{ImageInput, LlmRequest, LlmResponse, Provider};
use super::retry::{self, ErrorClass};
use crate::config::Config;
use crate::error::PipelineError;
use crate::exiftool::MetadataWriter;
use crate::pipeline::Validator;
use crate::types::{AnnotationRecord, AnnotationStatus, StockMetadata, TokenUsage};

/// Future returned by a [`GenerateFn`].
pub type GenerateFuture = BoxFuture<'static, Result<LlmResponse, PipelineError>>;

/// A provider call: `(api_key, request) -> response`.
pub type GenerateFn = Arc<dyn Fn(String, Arc<LlmRequest>) -> GenerateFuture + Send + Sync>;

/// Wrap a provider into a [`GenerateFn`].
pub fn generate_fn(provider: Provider) -> GenerateFn {
    let provider = Arc::new(provider);
    Arc::new(
        move |key: String, request: Arc<LlmRequest>| -> GenerateFuture {
            let provider = provider.clone();
            Box::pin(async move { provider.generate(&key, &request).await })
        },
    )
}

/// Retry settings for one image.
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    /// Maximum provider calls per image
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl AnnotateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry.max_attempts,
            base_delay_ms: config.retry.base_delay_ms,
            timeout_ms: config.limits.llm_timeout_ms,
        }
    }
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2000,
            timeout_ms: 60_000,
        }
    }
}

/// How one image ended.
#[derive(Debug)]
pub enum AnnotateOutcome {
    Annotated {
        metadata: StockMetadata,
        usage: TokenUsage,
        attempts: u32,
    },
    Failed {
        error: String,
        attempts: u32,
    },
    Cancelled {
        attempts: u32,
    },
}

impl AnnotateOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            AnnotateOutcome::Annotated { attempts, .. }
            | AnnotateOutcome::Failed { attempts, .. }
            | AnnotateOutcome::Cancelled { attempts } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnnotateOutcome::Annotated { .. })
    }

    /// Convert into a report record for `path`.
    pub fn into_record(self, path: &Path) -> AnnotationRecord {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut record = AnnotationRecord {
            file_path: path.to_path_buf(),
            file_name,
            status: AnnotationStatus::Failed,
            attempts: self.attempts(),
            metadata: None,
            usage: None,
            error: None,
        };
        match self {
            AnnotateOutcome::Annotated {
                metadata, usage, ..
            } => {
                record.status = AnnotationStatus::Annotated;
                record.metadata = Some(metadata);
                record.usage = Some(usage);
            }
            AnnotateOutcome::Failed { error, .. } => {
                record.error = Some(error);
            }
            AnnotateOutcome::Cancelled { .. } => {
                record.status = AnnotationStatus::Cancelled;
            }
        }
        record
    }
}

/// Drives provider calls for one image at a time, rotating keys on failure.
pub struct Annotator {
    generate: GenerateFn,
    provider_name: String,
    model: String,
    keys: KeyRing,
    writer: Arc<dyn MetadataWriter>,
    validator: Validator,
    options: AnnotateOptions,
}

impl Annotator {
    pub fn new(
        provider: Provider,
        keys: KeyRing,
        writer: Arc<dyn MetadataWriter>,
        validator: Validator,
        options: AnnotateOptions,
    ) -> Self {
        let provider_name = provider.kind().display_name().to_string();
        let model = provider.model().to_string();
        Self::with_generate_fn(
            generate_fn(provider),
            &provider_name,
            &model,
            keys,
            writer,
            validator,
            options,
        )
    }

    /// Build an annotator around an arbitrary provider call.
    pub fn with_generate_fn(
        generate: GenerateFn,
        provider_name: &str,
        model: &str,
        keys: KeyRing,
        writer: Arc<dyn MetadataWriter>,
        validator: Validator,
        options: AnnotateOptions,
    ) -> Self {
        Self {
            generate,
            provider_name: provider_name.to_string(),
            model: model.to_string(),
            keys,
            writer,
            validator,
            options,
        }
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Annotate one image, retrying and rotating keys as needed.
    pub async fn annotate(&mut self, path: &Path, cancel: &CancellationToken) -> AnnotateOutcome {
        let bytes = match self.validator.load(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return AnnotateOutcome::Failed {
                    error: e.to_string(),
                    attempts: 0,
                }
            }
        };
        let request = Arc::new(LlmRequest::stock_metadata(ImageInput::from_bytes(
            &bytes, path,
        )));
        drop(bytes);

        let max_attempts = self.options.max_attempts;
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            tracing::info!(
                "Sending {:?} to {} '{}' with key #{} {} (attempt {}/{})",
                path.file_name().unwrap_or_default(),
                self.provider_name,
                self.model,
                self.keys.index(),
                mask_key(self.keys.current()),
                attempt + 1,
                max_attempts
            );

            let error = match self.attempt(path, request.clone()).await {
                Ok((metadata, usage)) => {
                    return AnnotateOutcome::Annotated {
                        metadata,
                        usage,
                        attempts: attempt + 1,
                    };
                }
                Err(e) => e,
            };

            let class = retry::classify(&error);
            tracing::warn!(
                "Failed {:?} (attempt {}/{}): {error}",
                path.file_name().unwrap_or_default(),
                attempt + 1,
                max_attempts
            );
            last_error = error.to_string();

            let delay = match class {
                ErrorClass::RateLimited | ErrorClass::Transient => {
                    retry::backoff_duration(attempt, self.options.base_delay_ms)
                }
                ErrorClass::AuthFailed => Duration::from_millis(self.options.base_delay_ms),
                ErrorClass::ModelUnavailable => {
                    tracing::error!(
                        "Model '{}' looks invalid or deprecated; choose another model",
                        self.model
                    );
                    return AnnotateOutcome::Failed {
                        error: last_error,
                        attempts: attempt + 1,
                    };
                }
                ErrorClass::Fatal => {
                    return AnnotateOutcome::Failed {
                        error: last_error,
                        attempts: attempt + 1,
                    };
                }
            };

            if class.rotates_key() && self.keys.len() > 1 {
                let index = self.keys.rotate();
                tracing::info!(
                    "Switching to {} key #{index} {}",
                    self.provider_name,
                    mask_key(self.keys.current())
                );
            }

            if attempt + 1 == max_attempts {
                break;
            }

            tracing::info!("{class:?}: waiting {:.1}s before retrying", delay.as_secs_f64());
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return AnnotateOutcome::Cancelled { attempts: attempt + 1 };
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        AnnotateOutcome::Failed {
            error: format!("gave up after {max_attempts} attempts: {last_error}"),
            attempts: max_attempts,
        }
    }

    /// One provider call followed by parse and write.
    async fn attempt(
        &self,
        path: &Path,
        request: Arc<LlmRequest>,
    ) -> Result<(StockMetadata, TokenUsage), PipelineError> {
        let call = (self.generate)(self.keys.current().to_string(), request);
        let response = tokio::time::timeout(Duration::from_millis(self.options.timeout_ms), call)
            .await
            .map_err(|_| PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "llm".to_string(),
                timeout_ms: self.options.timeout_ms,
            })??;

        tracing::debug!("{} response: {}", self.provider_name, response.text);
        tracing::info!(
            "Token usage: prompt={}, completion={}, total={} ({}ms, {})",
            response.usage.prompt,
            response.usage.completion,
            response.usage.total,
            response.latency_ms,
            response.model
        );

        let metadata = parse_metadata(&self.provider_name, &response.text)?;
        tracing::info!("Title: {}", metadata.title);
        tracing::info!("Description: {}", metadata.description);
        tracing::info!(
            "Keywords ({}): {}",
            metadata.keyword_count(),
            metadata.keywords
        );

        self.writer.write(path, &metadata).await?;
        tracing::info!(
            "Metadata written to {:?} via {}",
            path.file_name().unwrap_or_default(),
            self.writer.name()
        );

        Ok((metadata, response.usage))
    }
}
