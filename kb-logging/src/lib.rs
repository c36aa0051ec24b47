//! kb-logging: NDJSON events + timestamps and content hashes.
//!
//! Append-only NDJSON logs are the post-mortem record of training runs; diagnostic
//! messages go through `tracing` in the crates that emit them.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Event schema version written into every event.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

pub fn now_ms() -> u64 {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    d.as_millis() as u64
}

/// Current UTC time as an RFC 3339 / ISO-8601 string.
pub fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Hex blake3 digest of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Schema ids carried by every event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionInfoV1 {
    pub event_schema_version: u32,
    pub feature_schema_id: u32,
    pub model_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainRunEventV1 {
    pub event: String,
    pub ts_ms: u64,
    pub v: VersionInfoV1,

    pub sessions: usize,
    pub pattern_examples: usize,
    pub move_examples: usize,
    pub epochs: u32,

    /// "trained" | "skipped" | "cancelled" | "error"
    pub status: String,
    pub pattern_mse: Option<f64>,
    pub move_mse: Option<f64>,
    pub accuracy: Option<f64>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum NdjsonError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for NdjsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NdjsonError::Io(e) => write!(f, "io: {e}"),
            NdjsonError::Json(e) => write!(f, "json: {e}"),
        }
    }
}

impl std::error::Error for NdjsonError {}

impl From<io::Error> for NdjsonError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for NdjsonError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Append-only NDJSON writer.
///
/// Contract: each call writes exactly one JSON object followed by a newline.
pub struct NdjsonWriter {
    w: BufWriter<File>,
    lines_since_flush: u64,
    flush_every_lines: u64,
}

impl NdjsonWriter {
    /// Open a file for append. Creates it (and its parent directory) if needed.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, NdjsonError> {
        Self::open_append_with_flush(path, 0)
    }

    /// `flush_every_lines=0` disables periodic flushing.
    pub fn open_append_with_flush(
        path: impl AsRef<Path>,
        flush_every_lines: u64,
    ) -> Result<Self, NdjsonError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            w: BufWriter::new(f),
            lines_since_flush: 0,
            flush_every_lines,
        })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), NdjsonError> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        self.lines_since_flush += 1;
        if self.flush_every_lines > 0 && self.lines_since_flush >= self.flush_every_lines {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), NdjsonError> {
        self.w.flush()?;
        self.lines_since_flush = 0;
        Ok(())
    }
}

/// Append a single event and flush.
pub fn append_event<T: Serialize>(path: impl AsRef<Path>, event: &T) -> Result<(), NdjsonError> {
    let mut w = NdjsonWriter::open_append(path)?;
    w.write_event(event)?;
    w.flush()
}

/// Read every line that parses as `T`, skipping blank, partial or foreign lines.
///
/// A missing file reads as empty.
pub fn read_ndjson_lenient<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, NdjsonError> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut out = Vec::new();
    for line in s.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(v) = serde_json::from_str::<T>(line) {
            out.push(v);
        }
    }
    Ok(out)
}

/// Write `bytes` to `path` via a sibling tmp file and rename.
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), io::Error> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
