use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::digest::{DigestFunction, RollingDigest};
use crate::entry::{
    timestamp_string, LogCollection, LogEntry, LogEntryBuilder, UserIdentity, UserProfile,
};
use crate::validate::{verify_collection, Verification};
use crate::LogError;

pub const ACKNOWLEDGED_POSTS_KEY: &str = "acknowledgedPosts";
pub const USER_PROFILE_KEY: &str = "userProfile";
pub const COMPLETION_NOTES_FIELD: &str = "completionNotes";
pub const COMPLETION_TIME_FIELD: &str = "completionTime";

/// Text key-value persistence port (browser-storage shaped).
pub trait KeyValueStore {
    /// # Errors
    /// Returns [`LogError::Storage`] when the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, LogError>;

    /// # Errors
    /// Returns [`LogError::Storage`] when the value cannot be written, e.g. quota exhaustion.
    fn set(&mut self, key: &str, value: &str) -> Result<(), LogError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    values: BTreeMap<String, String>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, LogError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LogError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    CheckIn,
    TaskCompletion,
}

impl LogKind {
    pub const ALL: [Self; 2] = [Self::CheckIn, Self::TaskCompletion];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "check_in",
            Self::TaskCompletion => "task_completion",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "check_in" => Some(Self::CheckIn),
            "task_completion" => Some(Self::TaskCompletion),
            _ => None,
        }
    }

    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::CheckIn => "checkInLogs",
            Self::TaskCompletion => "taskCompletionLogs",
        }
    }

    #[must_use]
    pub fn export_prefix(self) -> &'static str {
        match self {
            Self::CheckIn => "check-in-logs",
            Self::TaskCompletion => "task-completion-logs",
        }
    }
}

/// Append-only log collections persisted through a [`KeyValueStore`].
///
/// Every operation reads the current snapshot, applies its change, and writes
/// the whole collection back. Two writers sharing one backing store can lose
/// each other's appends (last write wins); nothing here detects or merges that.
#[derive(Debug, Clone)]
pub struct LogStore<S, D = RollingDigest> {
    storage: S,
    builder: LogEntryBuilder<D>,
}

impl<S: KeyValueStore> LogStore<S, RollingDigest> {
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { storage, builder: LogEntryBuilder::new() }
    }
}

impl<S: KeyValueStore, D: DigestFunction> LogStore<S, D> {
    #[must_use]
    pub fn with_builder(storage: S, builder: LogEntryBuilder<D>) -> Self {
        Self { storage, builder }
    }

    #[must_use]
    pub fn builder(&self) -> &LogEntryBuilder<D> {
        &self.builder
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Load the persisted collection for `kind`. Missing or malformed data
    /// yields an empty collection; stored elements that are not log entries
    /// are skipped.
    ///
    /// # Errors
    /// Returns [`LogError::Storage`] when the backing store cannot be read.
    pub fn load(&self, kind: LogKind) -> Result<LogCollection, LogError> {
        let key = kind.storage_key();
        let Some(raw) = self.storage.get(key)? else {
            return Ok(Vec::new());
        };

        match parse_stored(&raw) {
            Ok(values) => Ok(entries_of(key, &values)),
            Err(err) => {
                tracing::warn!(key, error = %err, "ignoring malformed stored collection");
                Ok(Vec::new())
            }
        }
    }

    /// Append `entry` to the collection for `kind` and persist the result.
    ///
    /// Stored elements that are not log entries are written back unchanged.
    ///
    /// # Errors
    /// Returns [`LogError::Storage`] when the read or the write fails, and
    /// [`LogError::Serialization`] when the stored collection is not a JSON
    /// array. Nothing is persisted in either case.
    pub fn append(&mut self, kind: LogKind, entry: LogEntry) -> Result<LogCollection, LogError> {
        let key = kind.storage_key();
        let mut values = self.load_for_write(key)?;
        values.push(serde_json::to_value(&entry).map_err(|err| {
            LogError::Serialization(format!("failed to serialize log entry: {err}"))
        })?);
        self.persist_json(key, &values)?;
        tracing::debug!(kind = kind.as_str(), len = values.len(), "appended log entry");
        Ok(entries_of(key, &values))
    }

    /// Replace the collection for `kind` with the entries not matching
    /// `predicate`. Stored elements that are not log entries are kept.
    ///
    /// # Errors
    /// Returns [`LogError::Storage`] when the read or the write fails, and
    /// [`LogError::Serialization`] when the stored collection is not a JSON
    /// array.
    pub fn discard_where<P>(
        &mut self,
        kind: LogKind,
        predicate: P,
    ) -> Result<LogCollection, LogError>
    where
        P: Fn(&LogEntry) -> bool,
    {
        let key = kind.storage_key();
        let values = self.load_for_write(key)?;
        let before = values.len();
        let kept: Vec<Value> = values
            .into_iter()
            .filter(|value| match LogEntry::deserialize(value) {
                Ok(entry) => !predicate(&entry),
                Err(_) => true,
            })
            .collect();
        self.persist_json(key, &kept)?;
        tracing::debug!(
            kind = kind.as_str(),
            discarded = before - kept.len(),
            "discarded log entries"
        );
        Ok(entries_of(key, &kept))
    }

    /// Drop every entry recorded on `date`.
    ///
    /// # Errors
    /// See [`LogStore::discard_where`].
    pub fn reset_day(&mut self, kind: LogKind, date: &str) -> Result<LogCollection, LogError> {
        self.discard_where(kind, |entry| entry.date() == date)
    }

    /// # Errors
    /// Returns [`LogError::Storage`] when the backing store cannot be read.
    pub fn verify(&self, kind: LogKind) -> Result<Vec<Verification>, LogError> {
        Ok(verify_collection(&self.load(kind)?, self.builder.digest()))
    }

    /// # Errors
    /// Returns [`LogError::Storage`] when the backing store cannot be read.
    pub fn acknowledged_posts(&self) -> Result<Vec<String>, LogError> {
        self.load_json(ACKNOWLEDGED_POSTS_KEY)
    }

    /// # Errors
    /// Returns [`LogError::Storage`] when the backing store cannot be read.
    pub fn is_post_acknowledged(&self, post_id: &str) -> Result<bool, LogError> {
        Ok(self.acknowledged_posts()?.iter().any(|post| post == post_id))
    }

    /// Mark `post_id` acknowledged and log the acknowledgment. Returns `None`
    /// when the post was already acknowledged.
    ///
    /// # Errors
    /// Returns [`LogError::Storage`] on read/write failure.
    pub fn acknowledge_post(
        &mut self,
        user: Option<&UserIdentity>,
        post_id: &str,
    ) -> Result<Option<LogEntry>, LogError> {
        let mut posts = self.acknowledged_posts()?;
        if posts.iter().any(|post| post == post_id) {
            return Ok(None);
        }

        // Log first: a failed append must leave the post unacknowledged so a
        // retry records the event.
        let entry = self.builder.build_acknowledgment(user, post_id)?;
        self.append(LogKind::CheckIn, entry.clone())?;
        posts.push(post_id.to_string());
        self.persist_json(ACKNOWLEDGED_POSTS_KEY, &posts)?;
        Ok(Some(entry))
    }

    /// Record a check-in whose wording reflects whether the post's orders were
    /// acknowledged beforehand.
    ///
    /// # Errors
    /// Returns [`LogError::Storage`] on read/write failure.
    pub fn check_in(
        &mut self,
        user: Option<&UserIdentity>,
        post_id: &str,
    ) -> Result<LogEntry, LogError> {
        let acknowledged = self.is_post_acknowledged(post_id)?;
        let entry = self.builder.build_check_in(user, post_id, acknowledged)?;
        self.append(LogKind::CheckIn, entry.clone())?;
        Ok(entry)
    }

    /// Record a task completion. `completionNotes` and `completionTime` are
    /// attached as extension fields, outside the integrity token.
    ///
    /// # Errors
    /// Returns [`LogError::Validation`] for a blank title, or
    /// [`LogError::Storage`] on read/write failure.
    pub fn complete_task(
        &mut self,
        user: Option<&UserIdentity>,
        task_id: &str,
        task_title: &str,
        notes: Option<&str>,
    ) -> Result<LogEntry, LogError> {
        if task_title.trim().is_empty() {
            return Err(LogError::Validation("task title MUST be non-empty".to_string()));
        }
        let entry = self.builder.build_task_completion(user, task_id, task_title)?;
        let completion_time = timestamp_string(OffsetDateTime::now_utc())?;
        let entry = entry
            .with_extension(COMPLETION_NOTES_FIELD, Value::from(notes.unwrap_or_default()))?
            .with_extension(COMPLETION_TIME_FIELD, Value::from(completion_time))?;
        self.append(LogKind::TaskCompletion, entry.clone())?;
        Ok(entry)
    }

    /// # Errors
    /// Returns [`LogError::Storage`] when the backing store cannot be read.
    pub fn profile(&self) -> Result<Option<UserProfile>, LogError> {
        self.load_json(USER_PROFILE_KEY)
    }

    /// # Errors
    /// Returns [`LogError::Storage`] when the profile cannot be written.
    pub fn save_profile(&mut self, profile: &UserProfile) -> Result<(), LogError> {
        self.persist_json(USER_PROFILE_KEY, profile)
    }

    fn load_for_write(&self, key: &str) -> Result<Vec<Value>, LogError> {
        match self.storage.get(key)? {
            Some(raw) => parse_stored(&raw).map_err(|err| {
                LogError::Serialization(format!(
                    "stored collection {key} is not a JSON array; refusing to overwrite it: {err}"
                ))
            }),
            None => Ok(Vec::new()),
        }
    }

    fn load_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, LogError> {
        let Some(raw) = self.storage.get(key)? else {
            return Ok(T::default());
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "ignoring malformed stored value");
                Ok(T::default())
            }
        }
    }

    fn persist_json<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), LogError> {
        let text = serde_json::to_string(value).map_err(|err| {
            LogError::Serialization(format!("failed to serialize value for {key}: {err}"))
        })?;
        self.storage.set(key, &text)
    }
}

/// Stored collection text as raw JSON elements. `null` reads as empty.
fn parse_stored(raw: &str) -> Result<Vec<Value>, serde_json::Error> {
    serde_json::from_str::<Option<Vec<Value>>>(raw).map(Option::unwrap_or_default)
}

fn entries_of(key: &str, values: &[Value]) -> LogCollection {
    let entries: LogCollection =
        values.iter().filter_map(|value| LogEntry::deserialize(value).ok()).collect();
    let skipped = values.len() - entries.len();
    if skipped > 0 {
        tracing::warn!(key, skipped, "skipping stored elements that are not log entries");
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{filter, local_today, LogFilter};
    use crate::validate::validate;

    #[derive(Debug, Default)]
    struct QuotaExceededStore {
        inner: MemoryKeyValueStore,
        reject_writes: bool,
        reject_key: Option<&'static str>,
    }

    impl KeyValueStore for QuotaExceededStore {
        fn get(&self, key: &str) -> Result<Option<String>, LogError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), LogError> {
            if self.reject_writes || self.reject_key == Some(key) {
                return Err(LogError::Storage(format!("quota exceeded writing {key}")));
            }
            self.inner.set(key, value)
        }
    }

    fn jane() -> UserIdentity {
        UserIdentity::new("Jane Doe", "1234", "Inspector")
    }

    fn memory_store() -> LogStore<MemoryKeyValueStore> {
        LogStore::new(MemoryKeyValueStore::new())
    }

    fn ok<T>(result: Result<T, LogError>) -> T {
        result.unwrap_or_else(|err| panic!("unexpected log error: {err}"))
    }

    fn old_shift_entry() -> Value {
        serde_json::json!({
            "action": "Old shift",
            "user": {"name": "Jane Doe", "badge": "1234", "position": "Inspector"},
            "postId": null,
            "timestamp": "2000-01-01T08:00:00.000Z",
            "date": "2000-01-01",
            "integrityToken": "0",
            "immutable": true
        })
    }

    // Shape written by the earliest browser acknowledgment flow: no user or date.
    fn legacy_acknowledgment() -> Value {
        serde_json::json!({
            "id": 1_737_986_709_123_i64,
            "timestamp": "2025-01-27T14:05:09.123Z",
            "type": "acknowledgment",
            "postId": "north-gate",
            "action": "Post order acknowledged"
        })
    }

    fn stored_values(store: &LogStore<impl KeyValueStore>, key: &str) -> Vec<Value> {
        let raw = ok(store.storage().get(key)).unwrap_or_default();
        serde_json::from_str(&raw).unwrap_or_else(|err| panic!("stored {key}: {err}"))
    }

    #[test]
    fn check_in_scenario_appends_valid_entry_for_today() {
        let mut store = memory_store();
        let entry = ok(store.builder().build_check_in(Some(&jane()), "credentialer-entry", true));
        let collection = ok(store.append(LogKind::CheckIn, entry));

        let Some(last) = collection.last() else {
            panic!("collection should not be empty");
        };
        assert_eq!(last.action(), "Checked in to credentialer-entry with acknowledged post orders");
        assert!(validate(last));

        // Entry dates are UTC; compare with the date the entry itself carries.
        let today = last.date().to_string();
        assert_eq!(filter(&collection, &LogFilter::by_date(today)).len(), 1);
        assert!(filter(&collection, &LogFilter::by_date("2000-01-01")).is_empty());
    }

    #[test]
    fn append_grows_by_one_and_keeps_prefix() {
        let mut store = memory_store();
        for index in 0..3 {
            let entry = ok(store.builder().build(&format!("Patrol round {index}"), None, None));
            ok(store.append(LogKind::CheckIn, entry));
        }
        let before = ok(store.load(LogKind::CheckIn));

        let entry = ok(store.builder().build("Patrol round 3", None, None));
        let after = ok(store.append(LogKind::CheckIn, entry));

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[..before.len()], before.as_slice());
    }

    #[test]
    fn kinds_are_persisted_under_separate_keys() {
        let mut store = memory_store();
        ok(store.check_in(Some(&jane()), "north-gate"));
        ok(store.complete_task(Some(&jane()), "task-42", "Sweep lane 3", None));

        assert_eq!(ok(store.load(LogKind::CheckIn)).len(), 1);
        let tasks = ok(store.load(LogKind::TaskCompletion));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].post_id(), Some("task-42"));
        assert!(ok(store.storage().get("taskCompletionLogs")).is_some());
    }

    #[test]
    fn malformed_stored_collection_reads_empty_but_is_never_overwritten() {
        let mut storage = MemoryKeyValueStore::new();
        ok(storage.set("checkInLogs", "{not json"));
        let mut store = LogStore::new(storage);

        assert!(ok(store.load(LogKind::CheckIn)).is_empty());
        let entry = ok(store.builder().build("Gate opened", None, None));
        let result = store.append(LogKind::CheckIn, entry);

        assert!(matches!(result, Err(LogError::Serialization(_))));
        assert_eq!(ok(store.storage().get("checkInLogs")).as_deref(), Some("{not json"));
    }

    #[test]
    fn null_stored_collection_is_empty_for_writes() {
        let mut storage = MemoryKeyValueStore::new();
        ok(storage.set("checkInLogs", "null"));
        let mut store = LogStore::new(storage);

        let entry = ok(store.builder().build("Gate opened", None, None));
        assert_eq!(ok(store.append(LogKind::CheckIn, entry)).len(), 1);
    }

    #[test]
    fn append_keeps_legacy_elements_alongside_entries() {
        let mut storage = MemoryKeyValueStore::new();
        let mixed = Value::Array(vec![old_shift_entry(), legacy_acknowledgment()]);
        ok(storage.set("checkInLogs", &mixed.to_string()));
        let mut store = LogStore::new(storage);

        let loaded = ok(store.load(LogKind::CheckIn));
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].action(), "Old shift");

        let entry = ok(store.builder().build_check_in(Some(&jane()), "north-gate", true));
        let after = ok(store.append(LogKind::CheckIn, entry.clone()));

        assert_eq!(after.len(), 2);
        assert_eq!(after[0].action(), "Old shift");
        assert_eq!(after[1], entry);

        let stored = stored_values(&store, "checkInLogs");
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0], old_shift_entry());
        assert_eq!(stored[1], legacy_acknowledgment());
    }

    #[test]
    fn reset_day_keeps_legacy_elements() {
        let mut storage = MemoryKeyValueStore::new();
        let mixed = Value::Array(vec![old_shift_entry(), legacy_acknowledgment()]);
        ok(storage.set("checkInLogs", &mixed.to_string()));
        let mut store = LogStore::new(storage);

        let kept = ok(store.reset_day(LogKind::CheckIn, "2000-01-01"));

        assert!(kept.is_empty());
        assert_eq!(stored_values(&store, "checkInLogs"), vec![legacy_acknowledgment()]);
    }

    #[test]
    fn write_failure_is_propagated_and_nothing_is_persisted() {
        let mut store = LogStore::new(QuotaExceededStore::default());
        ok(store.check_in(Some(&jane()), "north-gate"));
        store.storage_mut().reject_writes = true;

        let entry = ok(store.builder().build("Gate opened", None, None));
        let result = store.append(LogKind::CheckIn, entry);

        assert!(matches!(result, Err(LogError::Storage(message)) if message.contains("quota")));
        assert_eq!(ok(store.load(LogKind::CheckIn)).len(), 1);
    }

    #[test]
    fn acknowledging_a_post_is_recorded_once() {
        let mut store = memory_store();
        let first = ok(store.acknowledge_post(Some(&jane()), "lane-3"));
        let second = ok(store.acknowledge_post(Some(&jane()), "lane-3"));

        let Some(first) = first else {
            panic!("first acknowledgment should produce an entry");
        };
        assert_eq!(first.action(), "Acknowledged post orders for lane-3");
        assert!(second.is_none());
        assert_eq!(ok(store.acknowledged_posts()), vec!["lane-3".to_string()]);
        assert_eq!(ok(store.load(LogKind::CheckIn)).len(), 1);
    }

    #[test]
    fn failed_acknowledgment_log_leaves_post_unacknowledged_for_retry() {
        let mut store = LogStore::new(QuotaExceededStore::default());
        store.storage_mut().reject_key = Some("checkInLogs");

        let result = store.acknowledge_post(Some(&jane()), "lane-3");
        assert!(matches!(result, Err(LogError::Storage(_))));
        assert!(ok(store.acknowledged_posts()).is_empty());

        store.storage_mut().reject_key = None;
        let retry = ok(store.acknowledge_post(Some(&jane()), "lane-3"));

        assert!(retry.is_some());
        assert_eq!(ok(store.acknowledged_posts()), vec!["lane-3".to_string()]);
        assert_eq!(ok(store.load(LogKind::CheckIn)).len(), 1);
    }

    #[test]
    fn check_in_wording_follows_acknowledgment_state() {
        let mut store = memory_store();
        let before = ok(store.check_in(Some(&jane()), "lane-3"));
        ok(store.acknowledge_post(Some(&jane()), "lane-3"));
        let after = ok(store.check_in(Some(&jane()), "lane-3"));

        assert_eq!(before.action(), "Checked in to lane-3 - post orders not acknowledged");
        assert_eq!(after.action(), "Checked in to lane-3 with acknowledged post orders");
    }

    #[test]
    fn complete_task_rejects_blank_title() {
        let mut store = memory_store();
        let result = store.complete_task(Some(&jane()), "task-42", " ", None);
        assert!(matches!(result, Err(LogError::Validation(_))));
        assert!(ok(store.load(LogKind::TaskCompletion)).is_empty());
    }

    #[test]
    fn complete_task_attaches_notes_and_time_outside_the_token() {
        let mut store = memory_store();
        let entry = ok(store.complete_task(
            Some(&jane()),
            "task-42",
            "Sweep lane 3",
            Some("cones replaced"),
        ));
        assert_eq!(entry.extension(COMPLETION_NOTES_FIELD), Some(&Value::from("cones replaced")));
        let completion_time = entry
            .extension(COMPLETION_TIME_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_else(|| panic!("completion time should be set"));
        assert!(completion_time.ends_with('Z'));

        let stored = ok(store.load(LogKind::TaskCompletion));
        assert_eq!(stored, vec![entry]);
        assert!(validate(&stored[0]));

        let without_notes = ok(store.complete_task(None, "task-43", "Restock cones", None));
        assert_eq!(without_notes.extension(COMPLETION_NOTES_FIELD), Some(&Value::from("")));
        assert!(validate(&without_notes));
    }

    #[test]
    fn reset_day_discards_only_that_date() {
        let mut storage = MemoryKeyValueStore::new();
        let old = Value::Array(vec![old_shift_entry()]);
        ok(storage.set("checkInLogs", &old.to_string()));
        let mut store = LogStore::new(storage);
        let today_entry = ok(store.check_in(Some(&jane()), "north-gate"));

        let kept = ok(store.reset_day(LogKind::CheckIn, today_entry.date()));

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].action(), "Old shift");
        assert_eq!(ok(store.load(LogKind::CheckIn)), kept);
    }

    #[test]
    fn verify_reports_tampered_positions() {
        let mut storage = MemoryKeyValueStore::new();
        let tampered = Value::Array(vec![old_shift_entry()]);
        ok(storage.set("checkInLogs", &tampered.to_string()));
        let mut store = LogStore::new(storage);
        ok(store.check_in(None, "north-gate"));

        let report = ok(store.verify(LogKind::CheckIn));
        assert_eq!(report.iter().map(|item| item.valid).collect::<Vec<_>>(), vec![false, true]);
    }

    #[test]
    fn profile_round_trips_and_missing_profile_is_none() {
        let mut store = memory_store();
        assert_eq!(ok(store.profile()), None);

        let profile = UserProfile {
            name: "Jane Doe".to_string(),
            badge_number: "1234".to_string(),
            position: "Inspector".to_string(),
        };
        ok(store.save_profile(&profile));
        assert_eq!(ok(store.profile()), Some(profile));
        assert_eq!(
            ok(store.storage().get(USER_PROFILE_KEY)).as_deref(),
            Some(r#"{"name":"Jane Doe","badgeNumber":"1234","position":"Inspector"}"#)
        );
    }

    #[test]
    fn todays_entries_use_the_local_calendar_date() {
        let mut store = memory_store();
        ok(store.check_in(Some(&jane()), "north-gate"));
        let entries = ok(store.load(LogKind::CheckIn));
        let today = local_today();
        // The local date can differ from the UTC date near midnight.
        let expected = usize::from(entries[0].date() == today);
        assert_eq!(crate::query::todays(&entries, &today).len(), expected);
    }

    #[test]
    fn log_kind_names_round_trip() {
        for kind in LogKind::ALL {
            assert_eq!(LogKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(LogKind::parse("incident"), None);
    }
}
