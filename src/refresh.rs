//! One refresh run: config → fetch → replace
//!
//! Each gate is a hard stop. Every failure is logged at ERROR and turned into
//! [`RunOutcome::Aborted`]; nothing is retried and nothing panics. The next scheduled
//! invocation is the only recovery.

use crate::config::{Settings, load_credentials};
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::replace::replace;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};

/// Exit status of a completed or ignored-failure run
pub const EXIT_OK: u8 = 0;
/// Exit status of an aborted run when strict exit codes are enabled
pub const EXIT_FAILED: u8 = 1;

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// The production file was replaced; the old one lives at `backup`
    Updated {
        /// Path of the backup taken before promotion
        backup: PathBuf,
    },
    /// A gate failed; the error has already been logged
    Aborted(Error),
}

impl RunOutcome {
    /// Whether the production file was updated
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Updated { .. })
    }

    /// Process exit status. Aborted runs only exit non-zero when `fail_on_error` is set.
    pub fn exit_code(&self, fail_on_error: bool) -> u8 {
        match self {
            RunOutcome::Aborted(_) if fail_on_error => EXIT_FAILED,
            _ => EXIT_OK,
        }
    }
}

/// Runs the refresh pipeline for one set of [`Settings`]
#[derive(Debug)]
pub struct Refresher {
    settings: Settings,
    fetcher: Fetcher,
}

impl Refresher {
    /// Build a refresher, including its HTTP client
    pub fn new(settings: Settings) -> Result<Self> {
        let fetcher = Fetcher::new(settings.request_timeout)?;
        Ok(Self { settings, fetcher })
    }

    /// The settings this refresher runs with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Execute one run, bracketed by begin/end log lines
    pub async fn run(&self) -> RunOutcome {
        tracing::info!("----- Begin -----");
        let outcome = match self.run_gates().await {
            Ok(backup) => RunOutcome::Updated { backup },
            Err(e) => RunOutcome::Aborted(e),
        };
        tracing::info!("----- End -----");
        outcome
    }

    async fn run_gates(&self) -> Result<PathBuf> {
        let config_path = self.settings.config_path();
        if !exists(&config_path).await {
            tracing::error!(path = %config_path.display(), "Config file is missing! Abort.");
            return Err(Error::ConfigMissing { path: config_path });
        }

        let credentials = load_credentials(&config_path).await.inspect_err(|_| {
            tracing::error!("Failed to read config file. Abort.");
        })?;

        let payload = self.settings.payload_path();
        let fetched = self.fetcher.fetch_to(&credentials, &payload).await;
        let downloaded = exists(&payload).await;
        match fetched {
            Ok(status) if status == StatusCode::OK && downloaded => {
                tracing::info!("Code download successful.");
            }
            Ok(status) => {
                tracing::error!(
                    status = status.as_u16(),
                    "File download is missing! Request may have failed. Abort."
                );
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("downloaded file {} is missing", payload.display()),
                )));
            }
            Err(e) => {
                tracing::error!(
                    status = e.status().map(|s| s.as_u16()),
                    "File download is missing! Request may have failed. Abort."
                );
                return Err(e);
            }
        }

        replace(&payload, &self.settings.target_path()).await
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
