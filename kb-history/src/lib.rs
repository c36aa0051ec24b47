//! kb-history: Append-only NDJSON log of game sessions.

pub mod schema;
pub mod writer;

pub use writer::{read_sessions, recent_sessions, HistoryError, SessionLog, SessionRecord};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
