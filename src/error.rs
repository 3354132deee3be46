//! Error types for code-refresh
//!
//! Every failure a run can hit is a variant of [`Error`]. The orchestrator logs each one
//! at ERROR level together with its [`error_code`](Error::error_code) and aborts the run;
//! none of them are retried.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for code-refresh operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for code-refresh
#[derive(Debug, Error)]
pub enum Error {
    /// The source configuration file does not exist
    #[error("config file {} is missing", path.display())]
    ConfigMissing {
        /// Where the config file was expected
        path: PathBuf,
    },

    /// The source configuration file exists but could not be read
    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        /// The config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The source configuration file is not valid JSON
    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        /// The config file path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The source configuration parsed but does not have the expected shape
    #[error("invalid config data: {message}")]
    ConfigSchema {
        /// What was wrong with the document
        message: String,
    },

    /// The contents API answered with something other than 200 OK
    #[error("failed to retrieve file: status code {status}")]
    Remote {
        /// Status returned by the remote API
        status: StatusCode,
    },

    /// The response was 200 OK but its payload could not be turned into text
    #[error("failed to process received response content: {reason}")]
    Decode {
        /// Status returned by the remote API (always 200)
        status: StatusCode,
        /// Why decoding failed
        reason: String,
    },

    /// Renaming the production or fetched file failed
    #[error("failed to move {} to {}: {source}", source_path.display(), dest_path.display())]
    Replace {
        /// File being renamed
        source_path: PathBuf,
        /// Rename target
        dest_path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure before any HTTP status was received
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable, machine-readable code for this error, used as a log field
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::ConfigMissing { .. } => "config_missing",
            Error::ConfigRead { .. } | Error::ConfigParse { .. } => "config_parse",
            Error::ConfigSchema { .. } => "config_schema",
            Error::Remote { .. } => "remote_http",
            Error::Decode { .. } => "payload_decode",
            Error::Replace { .. } => "replace_os",
            Error::Network(_) => "network",
            Error::Io(_) => "io",
        }
    }

    /// HTTP status attached to this error, if the request got that far
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Remote { status } | Error::Decode { status, .. } => Some(*status),
            Error::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Shorthand for a schema error
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Error::ConfigSchema {
            message: message.into(),
        }
    }

    /// Shorthand for a decode error on a 200 response
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Error::Decode {
            status: StatusCode::OK,
            reason: reason.into(),
        }
    }
}
