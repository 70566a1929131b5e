//! Skein CLI binary.

use anyhow::Result;
use skein::cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Main entry point for the skein CLI.
///
/// Uses tokio's `current_thread` runtime: every command is a short sequence
/// of file reads and writes.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // RUST_LOG overrides, e.g. RUST_LOG=skein=debug,skein_jsonl=trace
    // Logs go to stderr so --json output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skein=info,skein_jsonl=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting skein CLI");

    let cli = Cli::parse_args();
    let code = cli.execute().await?;

    tracing::debug!("Skein CLI completed");
    Ok(code)
}
