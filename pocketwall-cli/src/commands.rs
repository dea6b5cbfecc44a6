//! Command handlers. Each returns the text to print on success.

use crate::args::{BackupCommand, Cli, Command, CryptoCommand, LicenseCommand, TrialCommand};
use crate::workspace::{default_data_dir, Workspace};
use anyhow::{bail, Context, Result};
use pocketwall_backup::{BackupOptions, RestoreRequest};
use pocketwall_crypto::EncryptedPackage;
use pocketwall_license::{
    activate, current_entitlement, deactivate, generate, validate, LicenseDuration, LicenseTier,
    TrialStatus, INVALID_KEY_MESSAGE,
};
use pocketwall_types::{DirectorySaveTarget, SystemClock, UserId};
use std::io::Read;
use std::path::Path;

/// Runs a parsed command line.
pub async fn run(cli: Cli) -> Result<String> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let workspace = Workspace::open(data_dir).await?;

    match cli.command {
        Command::Backup(cmd) => backup(&workspace, &cli.user, cmd).await,
        Command::License(cmd) => license(&workspace, cmd),
        Command::Trial(cmd) => trial(&workspace, cmd).await,
        Command::Crypto(cmd) => crypto(&workspace, cmd).await,
    }
}

async fn backup(workspace: &Workspace, user: &str, cmd: BackupCommand) -> Result<String> {
    let manager = workspace.backups();

    match cmd {
        BackupCommand::Create {
            encrypt,
            password,
            out,
        } => {
            let options = BackupOptions {
                encrypt,
                password: password.password,
                user_id: UserId::from(user),
            };
            let target = DirectorySaveTarget::new(&out);
            let outcome = manager
                .create_backup(&options, &target)
                .await
                .context("Backup failed")?;
            if !outcome.saved {
                bail!("Backup was not saved");
            }
            Ok(format!(
                "Wrote {}backup {}",
                if outcome.encrypted { "encrypted " } else { "" },
                target.path_for(&outcome.filename).display()
            ))
        }
        BackupCommand::Restore {
            file,
            password,
            force,
        } => {
            let content = read_file(&file).await?;
            let filename = file_name(&file);
            let report = manager
                .restore_backup(RestoreRequest {
                    content: &content,
                    filename: filename.as_deref(),
                    password: &password.password,
                    current_user_id: user,
                    force,
                })
                .await
                .context("Restore failed")?;
            let owner = report
                .meta
                .as_ref()
                .map(|m| m.user_id.to_string())
                .unwrap_or_else(|| UserId::anonymous().to_string());
            Ok(format!(
                "Restored {} collections from {} (owner {owner}, {:?}{})",
                report.collections,
                file.display(),
                report.decoding,
                if report.forced { ", ownership overridden" } else { "" }
            ))
        }
        BackupCommand::Inspect { file, password } => {
            let content = read_file(&file).await?;
            let filename = file_name(&file);
            let (parsed, decoding) = manager
                .inspect(&content, filename.as_deref(), &password.password)
                .await
                .context("Could not read backup")?;
            let mut lines = vec![format!("Decoding: {decoding:?}")];
            match &parsed.meta {
                Some(meta) => {
                    lines.push(format!("Version: {}", meta.version));
                    lines.push(format!("Created: {}", meta.created_at.to_rfc3339()));
                    lines.push(format!("Owner: {}", meta.user_id));
                    lines.push(format!("Encrypted: {}", meta.encrypted));
                }
                None => lines.push("No metadata".to_string()),
            }
            let mut collections: Vec<&String> = parsed.payload.keys().collect();
            collections.sort();
            lines.push(format!(
                "Collections: {}",
                collections
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            Ok(lines.join("\n"))
        }
    }
}

fn license(workspace: &Workspace, cmd: LicenseCommand) -> Result<String> {
    let settings = workspace.settings();

    match cmd {
        LicenseCommand::Generate {
            tier,
            duration,
            count,
        } => {
            let tier: LicenseTier = tier.parse()?;
            let duration: LicenseDuration = duration.parse()?;
            let keys: Vec<String> = (0..count).map(|_| generate(tier, duration)).collect();
            Ok(keys.join("\n"))
        }
        LicenseCommand::Validate { key } => {
            let report = validate(&key);
            match (report.tier, report.duration) {
                (Some(tier), Some(duration)) if report.is_valid => {
                    Ok(format!("Valid {tier} license ({duration})"))
                }
                _ => bail!(INVALID_KEY_MESSAGE),
            }
        }
        LicenseCommand::Activate { key } => {
            let record = activate(&key, &settings, &SystemClock)?;
            Ok(format!(
                "Activated {} license, expires {}",
                record.license_tier,
                record.license_expires_at.to_rfc3339()
            ))
        }
        LicenseCommand::Status => match current_entitlement(&settings, &SystemClock)? {
            None => Ok("No license activated".to_string()),
            Some(entitlement) => Ok(format!(
                "{} license ({}), {} {}",
                entitlement.tier,
                entitlement.duration,
                if entitlement.expired { "expired" } else { "expires" },
                entitlement.expires_at.to_rfc3339()
            )),
        },
        LicenseCommand::Deactivate => Ok(if deactivate(&settings)? {
            "License removed".to_string()
        } else {
            "No license activated".to_string()
        }),
    }
}

async fn trial(workspace: &Workspace, cmd: TrialCommand) -> Result<String> {
    let trial = workspace.trial()?;
    let status = match cmd {
        TrialCommand::Status => trial.check_status().await?,
        TrialCommand::Reset => trial.reset_trial().await?,
        TrialCommand::Expire => trial.expire_trial().await?,
    };
    Ok(describe_trial(&status))
}

fn describe_trial(status: &TrialStatus) -> String {
    if status.is_expired {
        format!("Trial expired (started {})", status.start_time.to_rfc3339())
    } else {
        format!(
            "Trial active, {} hours remaining (started {})",
            status.remaining_hours,
            status.start_time.to_rfc3339()
        )
    }
}

async fn crypto(workspace: &Workspace, cmd: CryptoCommand) -> Result<String> {
    let cipher = workspace.cipher();

    match cmd {
        CryptoCommand::Encrypt { input, password } => {
            require_password(&password.password)?;
            let plaintext = read_input(input.as_deref()).await?;
            let package = cipher.seal_async(plaintext, password.password).await?;
            Ok(serde_json::to_string_pretty(&package)?)
        }
        CryptoCommand::Decrypt { input, password } => {
            require_password(&password.password)?;
            let raw = read_input(input.as_deref()).await?;
            let json = String::from_utf8(raw).context("Package is not UTF-8")?;
            let package = EncryptedPackage::from_json(json.trim())?;
            let plaintext = cipher
                .open_async(package, password.password)
                .await
                .context("Decryption failed")?;
            Ok(String::from_utf8_lossy(&plaintext).into_owned())
        }
    }
}

fn require_password(password: &str) -> Result<()> {
    if password.is_empty() {
        bail!("A password is required (--password or POCKETWALL_PASSWORD)");
    }
    Ok(())
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

