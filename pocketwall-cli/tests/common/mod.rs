//! Shared helpers for CLI tests.

#![allow(dead_code)]

use clap::Parser;
use pocketwall_cli::{run, Cli};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A data directory with a cheap KDF configured.
pub fn data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.json"),
        r#"{"kdf_iterations": 1000}"#,
    )
    .unwrap();
    dir
}

/// Seeds `data.json` with a few collections.
pub fn seed_data(dir: &Path) {
    fs::write(
        dir.join("data.json"),
        r#"{"transactions":[{"id":"t1","amount":-12.5}],"budgets":[{"limit":300}]}"#,
    )
    .unwrap();
}

/// Runs `pocketwall --data-dir <dir> <args...>`.
pub async fn pw(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    let mut argv = vec![
        "pocketwall".to_string(),
        "--data-dir".to_string(),
        dir.display().to_string(),
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    run(Cli::try_parse_from(argv)?).await
}

/// The single file in `dir` whose name starts with `prefix`.
pub fn only_file(dir: &Path, prefix: &str) -> std::path::PathBuf {
    let mut matches: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with(prefix))
        })
        .collect();
    assert_eq!(matches.len(), 1, "expected one {prefix}* file in {}", dir.display());
    matches.remove(0)
}
