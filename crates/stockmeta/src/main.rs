//! Stockmeta CLI - AI stock photography metadata for image folders.
//!
//! Sends each image to Gemini or OpenAI, asks for a title, description and
//! keywords, and writes them into the file's XMP fields with ExifTool.
//!
//! # Usage
//!
//! ```bash
//! # Annotate a folder with Gemini, two keys
//! stockmeta annotate ./shots --api-key AIza... --api-key AIza...
//!
//! # Use OpenAI and keep a JSONL report
//! stockmeta annotate ./shots --provider openai --keys-file keys.txt --report run.jsonl --format jsonl
//!
//! # Check that ExifTool is installed
//! stockmeta check
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Stockmeta - AI stock photography metadata for image folders.
#[derive(Parser, Debug)]
#[command(name = "stockmeta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate metadata for images and write it into the files
    Annotate(cli::annotate::AnnotateArgs),

    /// Check ExifTool and API key setup
    Check(cli::check::CheckArgs),

    /// List model choices per provider
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match stockmeta_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `stockmeta config path`."
            );
            stockmeta_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Stockmeta v{}", stockmeta_core::VERSION);

    match cli.command {
        Commands::Annotate(args) => cli::annotate::execute(args).await,
        Commands::Check(args) => cli::check::execute(args).await,
        Commands::Models(args) => cli::models::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
