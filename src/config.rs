//! Configuration types for code-refresh
//!
//! Two kinds of configuration exist:
//! - [`Settings`] describes *where* things live (working directory, file names, log file)
//!   and how a run behaves (request timeout, log level, exit policy). It comes from the
//!   command line.
//! - The source document (`.config` by default) holds the API token and the contents URL.
//!   It is read fresh on every run by [`load_credentials`].
//!
//! Example source document:
//!
//! ```json
//! {"config": {
//!     "urls": [{"id": "1", "value": "https://api.github.com/repos/<OWNER>/<REPO>/contents/<DIR>/<FILE>"}],
//!     "tokens": [{"id": "1", "value": "<PAT>"}]
//! }}
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Runtime settings for a refresh run
#[derive(Clone, Debug)]
pub struct Settings {
    /// Directory every other path is resolved against (default: ".")
    pub working_dir: PathBuf,

    /// Source document file name (default: ".config")
    pub config_file: PathBuf,

    /// Staging file the fetched payload is written to (default: "payload.py")
    pub payload_file: PathBuf,

    /// Production file kept in sync (default: "target_file.py")
    pub target_file: PathBuf,

    /// Append-only log file (default: "refresh_code.log")
    pub log_file: PathBuf,

    /// Timeout for the contents request (None = wait forever, default: 60s)
    pub request_timeout: Option<Duration>,

    /// Minimum level written to the log (default: INFO)
    pub log_level: Level,

    /// Exit non-zero when a run aborts (default: false, the run always exits 0)
    pub fail_on_error: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            payload_file: PathBuf::from(DEFAULT_PAYLOAD_FILE),
            target_file: PathBuf::from(DEFAULT_TARGET_FILE),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            request_timeout: Some(default_request_timeout()),
            log_level: Level::INFO,
            fail_on_error: false,
        }
    }
}

impl Settings {
    /// Settings with every file resolved inside `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: dir.into(),
            ..Default::default()
        }
    }

    /// Full path of the source document
    pub fn config_path(&self) -> PathBuf {
        self.working_dir.join(&self.config_file)
    }

    /// Full path of the staging file
    pub fn payload_path(&self) -> PathBuf {
        self.working_dir.join(&self.payload_file)
    }

    /// Full path of the production file
    pub fn target_path(&self) -> PathBuf {
        self.working_dir.join(&self.target_file)
    }

    /// Full path of the log file
    pub fn log_path(&self) -> PathBuf {
        self.working_dir.join(&self.log_file)
    }
}

/// Default source document file name
pub const DEFAULT_CONFIG_FILE: &str = ".config";
/// Default staging file name
pub const DEFAULT_PAYLOAD_FILE: &str = "payload.py";
/// Default production file name
pub const DEFAULT_TARGET_FILE: &str = "target_file.py";
/// Default log file name
pub const DEFAULT_LOG_FILE: &str = "refresh_code.log";

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

/// The source document: `{"config": {"urls": [...], "tokens": [...]}}`
#[derive(Clone, Debug, Deserialize)]
pub struct SourceDocument {
    /// The single top-level section
    pub config: SourceSection,
}

/// Token and URL lists. Only the first entry of each is used.
#[derive(Clone, Debug, Deserialize)]
pub struct SourceSection {
    /// Contents API URLs
    pub urls: Vec<Entry>,
    /// API tokens
    pub tokens: Vec<Entry>,
}

/// An identifier/value pair
#[derive(Clone, Deserialize)]
pub struct Entry {
    /// Free-form identifier, unused
    #[serde(default)]
    pub id: Option<String>,
    /// The token or URL
    pub value: String,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Entries may hold tokens
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// The (token, url) pair a run fetches with
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// API token sent as `Authorization: token <token>`
    pub token: String,
    /// Contents API URL
    pub url: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("url", &self.url)
            .finish()
    }
}

impl TryFrom<SourceDocument> for Credentials {
    type Error = Error;

    fn try_from(doc: SourceDocument) -> Result<Self> {
        let token = first_value(doc.config.tokens, "tokens")?;
        let url = first_value(doc.config.urls, "urls")?;
        Ok(Self { token, url })
    }
}

fn first_value(entries: Vec<Entry>, key: &str) -> Result<String> {
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| Error::schema(format!("config.{key} is empty")))?;
    if entry.value.trim().is_empty() {
        return Err(Error::schema(format!("config.{key}[0].value is empty")));
    }
    Ok(entry.value)
}

/// Parse source document text into credentials
///
/// The root must be a JSON object; lists and scalars are rejected before any key lookup.
pub fn parse_credentials(text: &str, path: &Path) -> Result<Credentials> {
    let value: Value = serde_json::from_str(text).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    if !value.is_object() {
        return Err(Error::schema(format!(
            "config data type is invalid (is: {}, should be: object)",
            json_type(&value)
        )));
    }

    let doc: SourceDocument =
        serde_json::from_value(value).map_err(|e| Error::schema(e.to_string()))?;
    Credentials::try_from(doc)
}

/// Read and validate the source document at `path`
///
/// Logs one ERROR line on failure and nothing on success. The caller is expected to have
/// checked that the file exists.
pub async fn load_credentials(path: &Path) -> Result<Credentials> {
    let result = match tokio::fs::read_to_string(path).await {
        Ok(text) => parse_credentials(&text, path),
        Err(source) => Err(Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        }),
    };

    if let Err(e) = &result {
        tracing::error!(code = e.error_code(), error = %e, "Failed to read config data content.");
    }
    result
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
