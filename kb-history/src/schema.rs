//! Session log record layout.

/// Version of the session record wrapper.
pub const SESSION_RECORD_VERSION: u32 = 1;
