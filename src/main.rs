//! Command line entry point: one refresh run per invocation.

use clap::Parser;
use code_refresh::config::{
    DEFAULT_CONFIG_FILE, DEFAULT_LOG_FILE, DEFAULT_PAYLOAD_FILE, DEFAULT_TARGET_FILE,
};
use code_refresh::{Refresher, RunOutcome, Settings, logging};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "code-refresh",
    version,
    about = "Refresh a local production file from a private GitHub repository"
)]
struct Cli {
    /// Working directory every other path is relative to
    #[arg(short = 'C', long = "dir", default_value = ".")]
    dir: PathBuf,

    /// Config file holding the token and contents URL
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Staging file for the downloaded payload
    #[arg(long, default_value = DEFAULT_PAYLOAD_FILE)]
    payload: PathBuf,

    /// Production file to replace
    #[arg(long, default_value = DEFAULT_TARGET_FILE)]
    target: PathBuf,

    /// Append-only log file
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Request timeout in seconds (0 waits forever)
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Minimum level written to the log
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Exit with status 1 when the run aborts
    #[arg(long)]
    strict_exit: bool,
}

impl Cli {
    fn into_settings(self) -> Settings {
        Settings {
            working_dir: self.dir,
            config_file: self.config,
            payload_file: self.payload,
            target_file: self.target,
            log_file: self.log_file,
            request_timeout: (self.timeout_secs > 0)
                .then(|| Duration::from_secs(self.timeout_secs)),
            log_level: self.log_level,
            fail_on_error: self.strict_exit,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = Cli::parse().into_settings();

    if let Err(e) = logging::init(&settings.log_path(), settings.log_level) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let fail_on_error = settings.fail_on_error;
    let outcome = match Refresher::new(settings) {
        Ok(refresher) => refresher.run().await,
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "Failed to create HTTP client. Abort.");
            RunOutcome::Aborted(e)
        }
    };

    ExitCode::from(outcome.exit_code(fail_on_error))
}
