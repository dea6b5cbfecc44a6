//! PocketWall command-line tool.
//!
//! Usage:
//!   pocketwall backup create --encrypt --password hunter2 --out ~/Backups
//!   pocketwall backup restore ~/Backups/pocketwall_backup_....enc.pwb --password hunter2
//!   pocketwall license generate --tier pro --duration 12M
//!   pocketwall trial status
//!
//! Logging goes to stderr; `RUST_LOG` overrides the default filter.

use anyhow::Result;
use clap::Parser;
use pocketwall_cli::{run, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let output = run(cli).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
