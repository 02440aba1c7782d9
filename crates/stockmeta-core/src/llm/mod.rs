//! Vision provider integration for stock metadata generation.
//!
//! Gemini and OpenAI are called through a single [`Provider`] that branches on
//! [`ProviderKind`](crate::types::ProviderKind). The [`Annotator`] wraps that
//! call in key rotation, retry classification and exponential backoff.

pub mod annotator;
pub(crate) mod gemini;
pub mod keys;
pub(crate) mod openai;
pub mod parse;
pub mod provider;
pub mod retry;

pub use annotator::{
    generate_fn, AnnotateOptions, AnnotateOutcome, Annotator, GenerateFn, GenerateFuture,
};
pub use keys::{classify_key, mask_key, KeyRing, KeySet};
pub use parse::parse_metadata;
pub use provider::{ImageInput, LlmRequest, LlmResponse, Provider};
pub use retry::{classify, ErrorClass};
