//! Promote a fetched file to production, keeping a timestamped backup
//!
//! The sequence is backup-then-promote:
//! 1. rename `production` to `production_<YYYYMMDD-HHMMSS>`
//! 2. rename `fetched` to `production`
//!
//! Step 2 never starts unless step 1 succeeded, so the previous production file is never
//! lost without a backup. Backups are never overwritten: if the backup name is already
//! taken (two replacements within the same second), the replacement fails before
//! anything is renamed. If step 2 fails, no production file exists until the next
//! successful run; the backup and the unrenamed fetched file are left on disk.

use crate::error::{Error, Result};
use chrono::{Local, NaiveDateTime};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// `strftime` format of the backup suffix
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Backup path for `production` taken at `at`: the production path plus `_<timestamp>`
#[must_use]
pub fn backup_path(production: &Path, at: NaiveDateTime) -> PathBuf {
    let mut name = OsString::from(production.as_os_str());
    name.push("_");
    name.push(at.format(BACKUP_TIMESTAMP_FORMAT).to_string());
    PathBuf::from(name)
}

/// Back up `production` and move `fetched` into its place, using the local clock
///
/// Returns the backup path.
pub async fn replace(fetched: &Path, production: &Path) -> Result<PathBuf> {
    replace_at(fetched, production, Local::now().naive_local()).await
}

/// [`replace`] with an explicit backup timestamp
pub async fn replace_at(fetched: &Path, production: &Path, at: NaiveDateTime) -> Result<PathBuf> {
    tracing::info!("Backing up production code.");

    let backup = backup_path(production, at);
    match backup_then_promote(fetched, production, &backup).await {
        Ok(()) => {
            tracing::info!(backup = %backup.display(), "Production code updated successfully.");
            Ok(backup)
        }
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "Failed to update production code.");
            Err(e)
        }
    }
}

async fn backup_then_promote(fetched: &Path, production: &Path, backup: &Path) -> Result<()> {
    ensure_backup_free(production, backup).await?;
    rename(production, backup).await?;
    rename(fetched, production).await
}

async fn ensure_backup_free(production: &Path, backup: &Path) -> Result<()> {
    let taken = tokio::fs::try_exists(backup)
        .await
        .map_err(|source| replace_error(production, backup, source))?;
    if taken {
        return Err(replace_error(
            production,
            backup,
            io::Error::new(io::ErrorKind::AlreadyExists, "backup already exists"),
        ));
    }
    Ok(())
}

fn replace_error(from: &Path, to: &Path, source: io::Error) -> Error {
    Error::Replace {
        source_path: from.to_path_buf(),
        dest_path: to.to_path_buf(),
        source,
    }
}

async fn rename(from: &Path, to: &Path) -> Result<()> {
    tokio::fs::rename(from, to)
        .await
        .map_err(|source| replace_error(from, to, source))
}
