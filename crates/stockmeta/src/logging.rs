//! Logging initialization.
//!
//! Logs go to stderr so the progress bar and summary stay readable and
//! stdout stays free for command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// HTTP internals are noisy at debug level.
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

/// Install the global subscriber.
///
/// `RUST_LOG`, when set, replaces the computed filter entirely.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` config section plus CLI flags.
pub fn init_from_config(
    config: &stockmeta_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = effective_level(&config.logging.level, verbose_override);
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

/// `--verbose` raises the level to debug unless the config already asks for trace.
fn effective_level(configured: &str, verbose: bool) -> &str {
    match (verbose, configured) {
        (true, "trace") => "trace",
        (true, _) => "debug",
        (false, "trace" | "debug" | "info" | "warn" | "error") => configured,
        (false, _) => "info",
    }
}

fn filter_directive(level: &str) -> String {
    format!("{level},{QUIET_DEPENDENCIES}")
}
