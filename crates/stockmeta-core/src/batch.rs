//! Sequential batch runner.
//!
//! Images are annotated one at a time, in discovery order, with a short
//! pause between them. The runner checks the cancellation token before each
//! image and during the pause; the current image is allowed to finish its
//! in-flight request.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::llm::{AnnotateOutcome, Annotator};
use crate::types::{AnnotationRecord, BatchSummary};

/// Configuration for the batch runner.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Pause between consecutive images
    pub inter_image_delay: Duration,
}

impl BatchOptions {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            inter_image_delay: Duration::from_millis(config.processing.inter_image_delay_ms),
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            inter_image_delay: Duration::from_millis(1000),
        }
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// An image is about to be annotated (`index` is zero-based)
    Started {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    /// An image reached a final state
    Finished(AnnotationRecord),
}

/// Runs an [`Annotator`] over a list of images.
pub struct BatchRunner {
    annotator: Annotator,
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(annotator: Annotator, options: BatchOptions) -> Self {
        Self { annotator, options }
    }

    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    /// Annotate `paths` in order, reporting progress through `on_event`.
    pub async fn run<F>(
        &mut self,
        paths: &[PathBuf],
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> BatchSummary
    where
        F: FnMut(BatchEvent) + Send,
    {
        let start = Instant::now();
        let mut summary = BatchSummary::default();

        if paths.is_empty() {
            tracing::warn!("No image files found; nothing to annotate");
            return summary;
        }

        tracing::info!(
            "Annotating {} images with {} '{}' ({} key(s)). Existing title, description and keywords will be overwritten.",
            paths.len(),
            self.annotator.provider_name(),
            self.annotator.model(),
            self.annotator.keys().len()
        );

        let total = paths.len();
        for (index, path) in paths.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!("Stop requested; {} image(s) not started", total - index);
                summary.cancelled = true;
                break;
            }

            summary.processed += 1;
            tracing::info!("Processing image {}/{}: {:?}", index + 1, total, path);
            on_event(BatchEvent::Started {
                index,
                total,
                path: path.clone(),
            });

            let outcome = self.annotator.annotate(path, cancel).await;
            match &outcome {
                AnnotateOutcome::Annotated { usage, .. } => {
                    summary.succeeded += 1;
                    summary.usage += *usage;
                }
                AnnotateOutcome::Failed { error, .. } => {
                    summary.failed += 1;
                    tracing::error!("Giving up on {:?}: {error}", path);
                }
                AnnotateOutcome::Cancelled { .. } => {
                    summary.cancelled = true;
                }
            }
            on_event(BatchEvent::Finished(outcome.into_record(path)));

            if summary.cancelled {
                tracing::info!("Processing stopped by user");
                break;
            }

            if index + 1 < total && !self.options.inter_image_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.options.inter_image_delay) => {}
                }
            }
        }

        summary.elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Processing finished. Succeeded: {}, Failed: {}, Total: {}",
            summary.succeeded,
            summary.failed,
            summary.processed
        );
        if summary.usage.total > 0 {
            tracing::info!(
                "Total token usage: prompt={}, completion={}, total={}",
                summary.usage.prompt,
                summary.usage.completion,
                summary.usage.total
            );
        }
        summary
    }
}
