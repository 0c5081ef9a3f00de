//! Append-only, checksum-tagged operations log for checkpoint check-ins,
//! post-order acknowledgments, and task completions.
//!
//! Entries are built once, tagged with an integrity token over their content
//! fields, and appended to collections persisted through a [`KeyValueStore`].
//! The integrity token is a tamper-evidence tag for accidental edits. It is not
//! a cryptographic guarantee.

mod digest;
mod entry;
mod query;
mod store;
mod validate;

pub use digest::{DigestFunction, RollingDigest, Sha256Digest};
pub use entry::{
    acknowledgment_action, canonicalize, check_in_action, date_string, task_completion_action,
    timestamp_string, LogCollection, LogEntry, LogEntryBuilder, UserIdentity, UserProfile,
    UNKNOWN_FIELD, UNKNOWN_NAME,
};
pub use query::{
    export, export_file_name, filter, local_today, newest_first, parse, summary_line,
    summary_stats, todays, unique_dates, unique_users, LogFilter, LogSummaryStats,
};
pub use store::{
    KeyValueStore, LogKind, LogStore, MemoryKeyValueStore, ACKNOWLEDGED_POSTS_KEY,
    COMPLETION_NOTES_FIELD, COMPLETION_TIME_FIELD, USER_PROFILE_KEY,
};
pub use validate::{validate, validate_with, verify_collection, Verification};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum LogError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}
