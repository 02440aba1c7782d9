//! Annotate setup: config overrides, key collection, ExifTool check, discovery.

use std::sync::Arc;
use std::time::Duration;

use stockmeta_core::config::expand_path;
use stockmeta_core::{
    AnnotateOptions, Annotator, BatchOptions, BatchRunner, Config, ExifTool, ImageDiscovery,
    KeySet, Provider, ProviderKind, Validator,
};

use super::{AnnotateArgs, AnnotateContext};
use crate::cli::prompt;

/// Validate input, load config, collect keys and assemble the batch runner.
///
/// An input without images still yields a context; the batch reports it.
pub async fn setup(args: &AnnotateArgs) -> anyhow::Result<AnnotateContext> {
    let input = expand_path(&args.input);
    if !input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file or folder path and try again.",
            input
        );
    }

    let mut config = Config::load()?;
    apply_overrides(&mut config, args);
    let kind = config.llm.provider;

    let mut keys = collect_keys(&config, args)?;
    if keys.for_provider(kind).is_empty() && !args.no_prompt && console::user_attended_stderr() {
        keys.extend(prompt::prompt_for_keys(kind)?);
    }
    let ring = keys.into_ring(kind).map_err(|e| {
        anyhow::anyhow!(
            "{e}\n\n  Hint: Pass --api-key, use --keys-file, or set {} / `llm.{}.api_keys` in the config.",
            env_var_for(kind),
            kind
        )
    })?;
    tracing::info!("Using {} {} key(s)", ring.len(), kind.display_name());

    let exiftool = ExifTool::from_config(&config.exiftool).with_dry_run(args.dry_run);
    if args.dry_run {
        tracing::info!("Dry run: metadata will be generated but not written");
    } else {
        match exiftool.version().await {
            Ok(version) => tracing::info!("ExifTool version: {version}"),
            Err(e) => anyhow::bail!(
                "{e}\n\n  Hint: Install ExifTool (https://exiftool.org), set `exiftool.program`, \
                 or use --dry-run."
            ),
        }
    }

    let paths = ImageDiscovery::new(&config.processing).discover(&input);

    let provider = Provider::from_config(
        kind,
        &config.llm,
        args.model.as_deref(),
        Duration::from_millis(config.limits.llm_timeout_ms),
    );
    let annotator = Annotator::new(
        provider,
        ring,
        Arc::new(exiftool),
        Validator::new(config.limits.clone()),
        AnnotateOptions::from_config(&config),
    );
    let runner = BatchRunner::new(annotator, BatchOptions::from_config(&config));

    Ok(AnnotateContext {
        runner,
        paths,
        report_format: args.format.into(),
    })
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(config: &mut Config, args: &AnnotateArgs) {
    if let Some(provider) = args.provider {
        config.llm.provider = provider.into();
    }
    if let Some(max_attempts) = args.max_attempts {
        config.retry.max_attempts = max_attempts;
    }
}

/// Merge keys from the config, then the keys file, then `--api-key` flags.
fn collect_keys(config: &Config, args: &AnnotateArgs) -> anyhow::Result<KeySet> {
    let mut keys = KeySet::from_config(&config.llm);

    if let Some(path) = &args.keys_file {
        let path = expand_path(path);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read keys file {:?}: {e}", path)
        })?;
        keys.extend(KeySet::from_lines(&content));
    }

    for key in &args.api_keys {
        keys.add(key);
    }

    Ok(keys)
}

fn env_var_for(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "GEMINI_API_KEY",
        ProviderKind::OpenAi => "OPENAI_API_KEY",
    }
}
