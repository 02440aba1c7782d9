//! Subcommand implementations.

pub mod annotate;
pub mod check;
pub mod config;
pub mod models;
pub mod prompt;
