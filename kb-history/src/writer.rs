use std::path::{Path, PathBuf};

use kb_core::GameSession;
use kb_logging::{NdjsonError, NdjsonWriter};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::SESSION_RECORD_VERSION;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("io/json error: {0}")]
    Ndjson(#[from] NdjsonError),
    #[error("invalid session: {0}")]
    InvalidSession(&'static str),
}

/// One line of the session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub record_version: u32,
    pub logged_ts_ms: u64,
    pub session: GameSession,
}

/// Append-only session log. The game engine pushes completed sessions here; the
/// training pipeline reads them back wholesale.
pub struct SessionLog {
    path: PathBuf,
    w: NdjsonWriter,
    appended: u64,
}

impl SessionLog {
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();
        let w = NdjsonWriter::open_append(&path)?;
        Ok(Self {
            path,
            w,
            appended: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sessions appended through this handle.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn append(&mut self, session: &GameSession) -> Result<(), HistoryError> {
        if session.id.is_empty() {
            return Err(HistoryError::InvalidSession("session id must be non-empty"));
        }
        let rec = SessionRecord {
            record_version: SESSION_RECORD_VERSION,
            logged_ts_ms: kb_logging::now_ms(),
            session: session.clone(),
        };
        self.w.write_event(&rec)?;
        self.appended += 1;
        Ok(())
    }

    pub fn extend<'a, I: IntoIterator<Item = &'a GameSession>>(
        &mut self,
        it: I,
    ) -> Result<(), HistoryError> {
        for s in it {
            self.append(s)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), HistoryError> {
        self.w.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), HistoryError> {
        self.flush()
    }
}

/// All sessions in log order. Blank, truncated or unparsable lines are skipped so a
/// crash mid-append never poisons the log. A missing file reads as empty.
pub fn read_sessions(path: impl AsRef<Path>) -> Result<Vec<GameSession>, HistoryError> {
    let recs: Vec<SessionRecord> = kb_logging::read_ndjson_lenient(path)?;
    Ok(recs.into_iter().map(|r| r.session).collect())
}

/// The `n` most recent sessions by `started_at_ms`, oldest first.
pub fn recent_sessions(path: impl AsRef<Path>, n: usize) -> Result<Vec<GameSession>, HistoryError> {
    let mut all = read_sessions(path)?;
    all.sort_by_key(|s| s.started_at_ms);
    let start = all.len().saturating_sub(n);
    Ok(all.split_off(start))
}
