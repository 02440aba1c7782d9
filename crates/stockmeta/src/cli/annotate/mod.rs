//! The `stockmeta annotate` command.

mod run;
mod setup;
pub mod types;

pub use types::{ProviderArg, ReportFormatArg};

use clap::Args;
use std::path::PathBuf;
use stockmeta_core::{BatchRunner, ReportFormat};

/// Arguments for the `annotate` command.
#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Image file or folder to annotate (folders are searched recursively)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Vision provider (overrides `llm.provider` in the config)
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model name (provider-specific; see `stockmeta models`)
    #[arg(short, long)]
    pub model: Option<String>,

    /// API key; repeat for several keys. Sorted to a provider by prefix.
    #[arg(long = "api-key", value_name = "KEY")]
    pub api_keys: Vec<String>,

    /// File with one API key per line
    #[arg(long, value_name = "FILE")]
    pub keys_file: Option<PathBuf>,

    /// Write a per-image report to this file
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ReportFormatArg,

    /// Generate metadata but do not write it into the files
    #[arg(long)]
    pub dry_run: bool,

    /// Provider calls per image before giving up
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Never prompt for API keys, even on a terminal
    #[arg(long)]
    pub no_prompt: bool,
}

/// Manual Default impl for constructing AnnotateArgs outside of clap.
///
/// Values match the clap `#[arg(default_value = ...)]` annotations above.
impl Default for AnnotateArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            provider: None,
            model: None,
            api_keys: Vec::new(),
            keys_file: None,
            report: None,
            format: ReportFormatArg::Json,
            dry_run: false,
            max_attempts: None,
            no_prompt: false,
        }
    }
}

/// Everything `run` needs, assembled by `setup`.
pub(crate) struct AnnotateContext {
    pub runner: BatchRunner,
    pub paths: Vec<PathBuf>,
    pub report_format: ReportFormat,
}

/// Execute the annotate command.
pub async fn execute(args: AnnotateArgs) -> anyhow::Result<()> {
    let ctx = setup::setup(&args).await?;
    run::run(ctx, &args).await
}
