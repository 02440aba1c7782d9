//! The `stockmeta check` command: verify ExifTool and key setup before a run.

use clap::Args;
use stockmeta_core::{Config, ExifTool, KeySet, ProviderKind};

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {}

/// Execute the check command.
///
/// Fails when ExifTool cannot be run or the active provider has no key.
pub async fn execute(_args: CheckArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let mut problems = 0;

    let exiftool = ExifTool::from_config(&config.exiftool);
    match exiftool.version().await {
        Ok(version) => println!("ExifTool:        ok (version {version})"),
        Err(e) => {
            println!("ExifTool:        FAILED ({e})");
            problems += 1;
        }
    }

    let keys = KeySet::from_config(&config.llm);
    for kind in [ProviderKind::Gemini, ProviderKind::OpenAi] {
        let count = keys.for_provider(kind).len();
        let active = config.llm.provider == kind;
        let label = format!("{} keys:", kind.display_name());
        println!(
            "{label:16} {count}{}",
            if active { "  (active provider)" } else { "" }
        );
        if active && count == 0 {
            problems += 1;
        }
    }

    println!("Config file:     {}", Config::default_path().display());

    if problems > 0 {
        anyhow::bail!("{problems} problem(s) found");
    }
    Ok(())
}
