//! Input-side pipeline components.
//!
//! - **discovery**: Find images by extension in a folder (or accept a single file)
//! - **validate**: Size and existence checks before an image is sent anywhere

pub mod discovery;
pub mod validate;

// Re-exports for convenient access
pub use discovery::ImageDiscovery;
pub use validate::Validator;
