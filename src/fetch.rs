//! Download a single file through the GitHub contents API
//!
//! The API answers `GET /repos/{owner}/{repo}/contents/{path}` with a JSON object whose
//! `content` field is the file, base64 encoded and wrapped at 60 columns. [`Fetcher`]
//! decodes it to UTF-8 text and writes it to the staging path.

use crate::config::Credentials;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Media type requesting the v3 JSON representation
pub const GITHUB_V3_JSON: &str = "application/vnd.github.v3+json";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The part of a contents API response we care about
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// HTTP client for the contents API
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Create a fetcher. `timeout` bounds the whole request; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetch `credentials.url` and write the decoded file to `dest`
    ///
    /// Returns the HTTP status on success. Failures carry the status too when one was
    /// received (see [`Error::status`]). On any failure `dest` is left as it was.
    pub async fn fetch_to(&self, credentials: &Credentials, dest: &Path) -> Result<StatusCode> {
        tracing::info!("Downloading latest code.");

        let result = self.fetch_inner(credentials, dest).await;
        if let Err(e) = &result {
            match e {
                Error::Remote { status } => tracing::error!(
                    code = e.error_code(),
                    "Failed to retrieve file. Status Code: {}",
                    status.as_u16()
                ),
                _ => tracing::error!(
                    code = e.error_code(),
                    error = %e,
                    "Failed to process received response content."
                ),
            }
        }
        result
    }

    async fn fetch_inner(&self, credentials: &Credentials, dest: &Path) -> Result<StatusCode> {
        let response = self
            .client
            .get(&credentials.url)
            .header(AUTHORIZATION, format!("token {}", credentials.token))
            .header(ACCEPT, GITHUB_V3_JSON)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Remote { status });
        }

        let body = response.bytes().await?;
        let text = decode_response(&body)?;

        tokio::fs::write(dest, text).await?;
        tracing::debug!(path = %dest.display(), "Payload written");
        Ok(status)
    }
}

/// Turn a contents API response body into the file text
pub fn decode_response(body: &[u8]) -> Result<String> {
    let parsed: ContentsResponse = serde_json::from_slice(body)
        .map_err(|e| Error::decode(format!("response is not a JSON object: {e}")))?;

    if let Some(encoding) = parsed.encoding.as_deref().filter(|e| *e != "base64") {
        return Err(Error::decode(format!(
            "unsupported content encoding {encoding:?}"
        )));
    }

    let content = parsed
        .content
        .ok_or_else(|| Error::decode("response has no content field"))?;
    decode_content(&content)
}

/// Decode base64 (possibly line-wrapped) into UTF-8 text
pub fn decode_content(content: &str) -> Result<String> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::decode(format!("content is not valid base64: {e}")))?;

    String::from_utf8(bytes)
        .map_err(|e| Error::decode(format!("content is not valid UTF-8: {e}")))
}
