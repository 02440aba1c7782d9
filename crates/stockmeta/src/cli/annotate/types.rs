//! CLI enum types for the annotate command: provider and report format.

use clap::ValueEnum;
use stockmeta_core::{ProviderKind, ReportFormat};

/// Supported vision providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// Google Gemini
    Gemini,
    /// OpenAI
    Openai,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Gemini => ProviderKind::Gemini,
            ProviderArg::Openai => ProviderKind::OpenAi,
        }
    }
}

/// Report file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormatArg {
    /// One JSON document with all images and the summary
    Json,
    /// One JSON object per line, written as images finish
    Jsonl,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Json => ReportFormat::Json,
            ReportFormatArg::Jsonl => ReportFormat::JsonLines,
        }
    }
}

impl std::fmt::Display for ReportFormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormatArg::Json => write!(f, "json"),
            ReportFormatArg::Jsonl => write!(f, "jsonl"),
        }
    }
}
