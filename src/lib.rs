//! # code-refresh
//!
//! Keep a local "production" file in sync with a single file in a private GitHub
//! repository. Designed to be run unattended from cron or another scheduler.
//!
//! A run:
//! 1. reads the API token and contents URL from a local JSON config file,
//! 2. downloads the file through the contents API and decodes it to a staging file,
//! 3. renames the current production file to `<name>_<YYYYMMDD-HHMMSS>` and moves the
//!    staging file into its place.
//!
//! Every step is logged to an append-only log file. Failures abort the run and are
//! reported only through that log (and, optionally, the exit code).
//!
//! ## Quick Start
//!
//! ```no_run
//! use code_refresh::{Refresher, Settings};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::in_dir("/srv/app");
//!     code_refresh::logging::init(&settings.log_path(), settings.log_level)?;
//!
//!     let outcome = Refresher::new(settings)?.run().await;
//!     println!("updated: {}", outcome.is_success());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Settings and source document loading
pub mod config;
/// Error types
pub mod error;
/// Contents API download and decoding
pub mod fetch;
/// Log line format and sinks
pub mod logging;
/// Run orchestration
pub mod refresh;
/// Backup-then-promote file replacement
pub mod replace;

// Re-export commonly used types
pub use config::{Credentials, Settings};
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use refresh::{Refresher, RunOutcome};
