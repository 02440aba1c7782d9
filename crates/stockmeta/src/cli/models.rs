//! The `stockmeta models` command for listing model choices.

use clap::Args;
use stockmeta_core::{Config, ProviderKind};

use super::annotate::ProviderArg;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Only list models for this provider
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let kinds: Vec<ProviderKind> = match args.provider {
        Some(p) => vec![p.into()],
        None => vec![ProviderKind::Gemini, ProviderKind::OpenAi],
    };

    for (i, kind) in kinds.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", model_listing(*kind, &config));
    }
    println!("\nAny other model name can be passed with --model.");
    Ok(())
}

/// Render the model list for one provider, marking the configured model.
fn model_listing(kind: ProviderKind, config: &Config) -> String {
    let configured = match kind {
        ProviderKind::Gemini => config.llm.gemini.model.as_str(),
        ProviderKind::OpenAi => config.llm.openai.model.as_str(),
    };
    let active = if config.llm.provider == kind {
        "  (active provider)"
    } else {
        ""
    };

    let mut out = format!("{} models{active}:\n", kind.display_name());
    for model in kind.known_models() {
        let marker = if *model == configured { "  (configured)" } else { "" };
        out.push_str(&format!("  - {model:24}{marker}\n"));
    }
    if !kind.known_models().contains(&configured) {
        out.push_str(&format!("  - {configured:24}  (configured, custom)\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_marks_configured_model() {
        let config = Config::default();
        let listing = model_listing(ProviderKind::Gemini, &config);
        assert!(listing.starts_with("Gemini models  (active provider):"));
        let line = listing
            .lines()
            .find(|l| l.contains("gemini-1.5-flash"))
            .unwrap();
        assert!(line.contains("(configured)"));
        assert!(listing.contains("gemini-2.5-flash"));
    }

    #[test]
    fn test_listing_shows_custom_model() {
        let mut config = Config::default();
        config.llm.openai.model = "gpt-9-vision".to_string();
        let listing = model_listing(ProviderKind::OpenAi, &config);
        assert!(listing.contains("gpt-9-vision"));
        assert!(listing.contains("custom"));
        assert!(!listing.contains("active provider"));
    }
}
