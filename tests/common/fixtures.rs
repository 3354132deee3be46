//! Working directory, config and contents API fixtures

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use code_refresh::Settings;
use code_refresh::logging::{self, MemorySink};
use std::path::Path;
use tempfile::TempDir;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the contents API mock answers on
pub const CONTENTS_PATH: &str = "/repos/owner/repo/contents/app/target_file.py";

/// Token written to the fixture config
pub const TOKEN: &str = "ghp_e2e_token";

/// A temp working directory plus settings pointing into it
pub struct Workspace {
    /// Keeps the directory alive
    pub dir: TempDir,
    /// Settings resolved inside `dir`
    pub settings: Settings,
}

impl Workspace {
    /// Empty working directory
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let settings = Settings::in_dir(dir.path());
        Self { dir, settings }
    }

    /// Root of the working directory
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a config whose first entries point at `server`
    pub fn write_config(&self, server: &MockServer) {
        let config = serde_json::json!({"config": {
            "urls": [
                {"id": "1", "value": format!("{}{}", server.uri(), CONTENTS_PATH)},
                {"id": "2", "value": "http://127.0.0.1:9/never-used"}
            ],
            "tokens": [
                {"id": "1", "value": TOKEN},
                {"id": "2", "value": "ghp_never_used"}
            ]
        }});
        self.write_raw_config(&config.to_string());
    }

    /// Write arbitrary text as the config file
    pub fn write_raw_config(&self, text: &str) {
        std::fs::write(self.settings.config_path(), text).unwrap();
    }

    /// Write the production file
    pub fn write_target(&self, content: &str) {
        std::fs::write(self.settings.target_path(), content).unwrap();
    }

    /// Write the staging file
    pub fn write_payload(&self, content: &str) {
        std::fs::write(self.settings.payload_path(), content).unwrap();
    }

    /// Sorted file names in the working directory
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Backup files of the production file
    pub fn backups(&self) -> Vec<String> {
        self.file_names()
            .into_iter()
            .filter(|n| n.starts_with("target_file.py_"))
            .collect()
    }
}

/// JSON body of a contents API response for `text`, wrapped the way the API wraps it
pub fn contents_body(text: &str) -> serde_json::Value {
    let encoded = STANDARD.encode(text);
    let wrapped: Vec<String> = encoded
        .as_bytes()
        .chunks(60)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect();
    serde_json::json!({
        "name": "target_file.py",
        "path": "app/target_file.py",
        "type": "file",
        "encoding": "base64",
        "content": wrapped.join("\n") + "\n",
    })
}

/// Mount a contents API response that requires the fixture token
pub async fn mount_contents(server: &MockServer, template: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(header("authorization", format!("token {TOKEN}").as_str()))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(template)
        .expect(times)
        .mount(server)
        .await;
}

/// Capture this thread's log output until the guard drops
pub fn capture_logs() -> (MemorySink, DefaultGuard) {
    let sink = MemorySink::new();
    let guard = tracing::subscriber::set_default(logging::subscriber(
        sink.clone(),
        EnvFilter::new("code_refresh=info"),
    ));
    (sink, guard)
}
