//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pocketwall")]
#[command(about = "PocketWall backups, licenses and trial management")]
#[command(version)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "POCKETWALL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Signed-in account id; omit when signed out
    #[arg(long, global = true, default_value = "")]
    pub user: String,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, restore or inspect backups
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Generate, validate and activate license keys
    #[command(subcommand)]
    License(LicenseCommand),

    /// Inspect or administer the evaluation trial
    #[command(subcommand)]
    Trial(TrialCommand),

    /// Encrypt or decrypt arbitrary data with a password
    #[command(subcommand)]
    Crypto(CryptoCommand),
}

#[derive(Args, Debug, Clone, Default)]
pub struct PasswordArg {
    /// Backup or data password
    #[arg(long, env = "POCKETWALL_PASSWORD", hide_env_values = true, default_value = "")]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// Write a backup of all local data
    Create {
        /// Encrypt the backup with --password
        #[arg(long)]
        encrypt: bool,

        #[command(flatten)]
        password: PasswordArg,

        /// Directory to write the backup into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Replace local data with a backup
    Restore {
        /// Backup file
        file: PathBuf,

        #[command(flatten)]
        password: PasswordArg,

        /// Restore even if the backup belongs to another account
        #[arg(long)]
        force: bool,
    },

    /// Show a backup's metadata without restoring it
    Inspect {
        /// Backup file
        file: PathBuf,

        #[command(flatten)]
        password: PasswordArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum LicenseCommand {
    /// Generate license keys
    Generate {
        /// Tier: starter, pro or elite
        #[arg(long)]
        tier: String,

        /// Duration: 1M, 3M, 6M or 12M
        #[arg(long, default_value = "12M")]
        duration: String,

        /// Number of keys to generate
        #[arg(long, default_value_t = 1)]
        count: usize,
    },

    /// Check a license key without activating it
    Validate {
        key: String,
    },

    /// Activate a license key on this installation
    Activate {
        key: String,
    },

    /// Show the active license
    Status,

    /// Remove the active license
    Deactivate,
}

#[derive(Subcommand, Debug)]
pub enum TrialCommand {
    /// Show remaining trial time (starts the trial on first use)
    Status,

    /// Restart the trial window
    Reset,

    /// End the trial immediately
    Expire,
}

#[derive(Subcommand, Debug)]
pub enum CryptoCommand {
    /// Encrypt a file (or stdin) into a JSON package
    Encrypt {
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,

        #[command(flatten)]
        password: PasswordArg,
    },

    /// Decrypt a JSON package from a file (or stdin)
    Decrypt {
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,

        #[command(flatten)]
        password: PasswordArg,
    },
}
