//! The `stockmeta config` command for configuration management.

use clap::{Args, Subcommand};
use stockmeta_core::{Config, KeySet};

use super::prompt::save_keys_to_config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Save API keys to the config file (sorted to a provider by prefix)
    AddKey {
        /// One or more keys
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::AddKey { keys } => {
            let mut set = KeySet::default();
            for key in &keys {
                set.add(key);
            }
            if set.gemini.is_empty() && set.openai.is_empty() {
                anyhow::bail!(
                    "No recognized keys.\n\n  Hint: Gemini keys start with 'AIza', OpenAI keys with 'sk-'."
                );
            }
            save_keys_to_config(&set)?;
            println!(
                "Saved {} Gemini and {} OpenAI key(s) to {}",
                set.gemini.len(),
                set.openai.len(),
                Config::default_path().display()
            );
        }
    }

    Ok(())
}
