//! Append-only run log
//!
//! Every component logs through `tracing`. This module builds the subscriber that turns
//! those events into lines of the form
//!
//! ```text
//! 09:05:03.142 INFO Downloading latest code.
//! 09:05:03.518 ERROR Failed to retrieve file. Status Code: 404 code="remote_http"
//! ```
//!
//! The writer is a parameter: the binary appends to the log file, tests pass a
//! [`MemorySink`] and read back what was written.

use crate::error::{Error, Result};
use chrono::Local;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Time-of-day format of each line, millisecond resolution
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

/// `HH:MM:SS.mmm LEVEL message [field=value ...]`, no spans, no target, no color
#[derive(Clone, Copy, Debug, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} {} ",
            Local::now().format(TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter admitting this crate's events at `level` and above
///
/// `RUST_LOG` overrides it when set.
pub fn filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(level)))
}

fn directive(level: Level) -> String {
    format!("code_refresh={}", level.as_str().to_ascii_lowercase())
}

/// Build a subscriber writing [`LineFormat`] lines to `writer`
pub fn subscriber<W>(writer: W, filter: EnvFilter) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_ansi(false)
            .with_writer(writer),
    )
}

/// Open `path` for appending, creating it if needed
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("Failed to open log file '{}': {}", path.display(), e),
            ))
        })
}

/// Install the file log as the process-wide subscriber
pub fn init(path: &Path, level: Level) -> Result<()> {
    let file = open_log_file(path)?;
    subscriber(Mutex::new(file), filter(level))
        .try_init()
        .map_err(|e| Error::Io(io::Error::other(format!("Failed to install logger: {}", e))))
}

/// In-memory log sink
///
/// Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }

    /// Written lines, without trailing newlines
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl io::Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for MemorySink {
    type Writer = MemorySink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
