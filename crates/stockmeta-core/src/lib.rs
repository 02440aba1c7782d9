//! Stockmeta Core - AI stock metadata for image files.
//!
//! Stockmeta sends each image in a folder to a vision model (Gemini or
//! OpenAI), asks for a stock-photography title, description and keyword
//! list, and writes the answer into the file's XMP fields with ExifTool.
//!
//! # Architecture
//!
//! ```text
//! Discover → Validate → Provider call (key ring, retry, backoff) → Parse → ExifTool → Report
//! ```
//!
//! Images are processed one at a time. A [`CancellationToken`] stops the
//! batch between images and interrupts retry waits.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use stockmeta_core::{
//!     AnnotateOptions, Annotator, BatchOptions, BatchRunner, CancellationToken, Config,
//!     ExifTool, ImageDiscovery, KeySet, Provider, Validator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> stockmeta_core::Result<()> {
//!     let config = Config::load()?;
//!     let kind = config.llm.provider;
//!     let provider = Provider::from_config(kind, &config.llm, None, Duration::from_secs(60));
//!     let keys = KeySet::from_config(&config.llm).into_ring(kind)?;
//!     let writer = Arc::new(ExifTool::from_config(&config.exiftool));
//!     let annotator = Annotator::new(
//!         provider,
//!         keys,
//!         writer,
//!         Validator::new(config.limits.clone()),
//!         AnnotateOptions::default(),
//!     );
//!
//!     let paths = ImageDiscovery::new(&config.processing).discover("./shots".as_ref());
//!     let mut runner = BatchRunner::new(annotator, BatchOptions::default());
//!     let summary = runner.run(&paths, &CancellationToken::new(), |_| {}).await;
//!     println!("Succeeded: {}", summary.succeeded);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod batch;
pub mod config;
pub mod error;
pub mod exiftool;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use batch::{BatchEvent, BatchOptions, BatchRunner};
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, StockmetaError};
pub use exiftool::{ExifTool, MetadataWriter};
pub use llm::{AnnotateOptions, AnnotateOutcome, Annotator, KeyRing, KeySet, Provider};
pub use output::{ReportFormat, ReportWriter};
pub use pipeline::{ImageDiscovery, Validator};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    AnnotationRecord, AnnotationStatus, BatchSummary, ProviderKind, StockMetadata, TokenUsage,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_annotate_options_from_config() {
        let config = Config::default();
        let options = AnnotateOptions::from_config(&config);
        assert_eq!(options.max_attempts, 5);
        assert_eq!(options.base_delay_ms, 2000);
        assert_eq!(options.timeout_ms, 60_000);
    }
}
