use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::digest::{DigestFunction, RollingDigest};
use crate::LogError;

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_FIELD: &str = "N/A";

pub type LogCollection = Vec<LogEntry>;

const RESERVED_FIELDS: [&str; 8] =
    ["action", "user", "postId", "timestamp", "date", "integrityToken", "hash", "immutable"];

/// Identity of the actor, copied into each entry at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct UserIdentity {
    pub name: String,
    pub badge: String,
    pub position: String,
}

impl UserIdentity {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        badge: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), badge: badge.into(), position: position.into() }
    }

    /// Placeholder identity recorded when no profile is available.
    #[must_use]
    pub fn sentinel() -> Self {
        Self::new(UNKNOWN_NAME, UNKNOWN_FIELD, UNKNOWN_FIELD)
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
}

/// Profile maintained by the operator; any field may be blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub badge_number: String,
    #[serde(default)]
    pub position: String,
}

impl UserProfile {
    /// Snapshot this profile, substituting sentinel values for blank fields.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            name: non_blank_or(&self.name, UNKNOWN_NAME),
            badge: non_blank_or(&self.badge_number, UNKNOWN_FIELD),
            position: non_blank_or(&self.position, UNKNOWN_FIELD),
        }
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// One recorded action.
///
/// Entries have no setters: content is fixed at construction and the
/// integrity token is never recomputed in place. Fields a legacy writer
/// attached beyond the canonical set are carried in `extensions` so that a
/// load-append-persist cycle does not strip them; they are not covered by the
/// integrity token.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    action: String,
    user: UserIdentity,
    post_id: Option<String>,
    timestamp: String,
    date: String,
    #[serde(default, alias = "hash", skip_serializing_if = "Option::is_none")]
    integrity_token: Option<String>,
    #[serde(default)]
    immutable: bool,
    #[serde(flatten)]
    extensions: BTreeMap<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalContent<'a> {
    action: &'a str,
    user: &'a UserIdentity,
    post_id: Option<&'a str>,
    timestamp: &'a str,
    date: &'a str,
}

impl LogEntry {
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    #[must_use]
    pub fn post_id(&self) -> Option<&str> {
        self.post_id.as_deref()
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    #[must_use]
    pub fn integrity_token(&self) -> Option<&str> {
        self.integrity_token.as_deref()
    }

    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// Attach an annotation next to the canonical fields.
    ///
    /// Extensions are not covered by the integrity token, so the entry still
    /// validates afterwards. Canonical field names are rejected.
    ///
    /// # Errors
    /// Returns `LogError::Validation` when `key` is blank or names a canonical field.
    pub fn with_extension(
        mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Self, LogError> {
        let key = key.into();
        if key.trim().is_empty() || RESERVED_FIELDS.contains(&key.as_str()) {
            return Err(LogError::Validation(format!("extension key {key:?} is reserved")));
        }
        self.extensions.insert(key, value);
        Ok(self)
    }

    /// Parsed creation instant, if the stored timestamp is well-formed RFC 3339.
    #[must_use]
    pub fn created_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.timestamp, &time::format_description::well_known::Rfc3339)
            .ok()
    }
}

/// Serialize the content fields of `entry` in their fixed order:
/// `action`, `user{name, badge, position}`, `postId`, `timestamp`, `date`.
///
/// # Errors
/// Returns [`LogError::Serialization`] when the content cannot be encoded.
pub fn canonicalize(entry: &LogEntry) -> Result<String, LogError> {
    canonical_text(&entry.action, &entry.user, entry.post_id(), &entry.timestamp, &entry.date)
}

fn canonical_text(
    action: &str,
    user: &UserIdentity,
    post_id: Option<&str>,
    timestamp: &str,
    date: &str,
) -> Result<String, LogError> {
    serde_json::to_string(&CanonicalContent { action, user, post_id, timestamp, date })
        .map_err(|err| LogError::Serialization(format!("failed to canonicalize entry: {err}")))
}

/// Render `at` as a millisecond-precision UTC instant, e.g. `2025-01-27T14:05:09.123Z`.
///
/// # Errors
/// Returns [`LogError::Validation`] when the instant cannot be formatted.
pub fn timestamp_string(at: OffsetDateTime) -> Result<String, LogError> {
    at.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .map_err(|err| LogError::Validation(format!("invalid timestamp: {err}")))
}

/// Render the calendar date of `at` in its own offset as `YYYY-MM-DD`.
///
/// # Errors
/// Returns [`LogError::Validation`] when the date cannot be formatted.
pub fn date_string(at: OffsetDateTime) -> Result<String, LogError> {
    at.format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| LogError::Validation(format!("invalid date: {err}")))
}

#[must_use]
pub fn check_in_action(post_id: &str, acknowledged: bool) -> String {
    if acknowledged {
        format!("Checked in to {post_id} with acknowledged post orders")
    } else {
        format!("Checked in to {post_id} - post orders not acknowledged")
    }
}

#[must_use]
pub fn acknowledgment_action(post_id: &str) -> String {
    format!("Acknowledged post orders for {post_id}")
}

#[must_use]
pub fn task_completion_action(task_title: &str) -> String {
    format!("Completed task: {task_title}")
}

/// Builds integrity-tagged entries with a fixed [`DigestFunction`].
#[derive(Debug, Clone, Default)]
pub struct LogEntryBuilder<D = RollingDigest> {
    digest: D,
}

impl LogEntryBuilder<RollingDigest> {
    #[must_use]
    pub fn new() -> Self {
        Self { digest: RollingDigest }
    }
}

impl<D: DigestFunction> LogEntryBuilder<D> {
    #[must_use]
    pub fn with_digest(digest: D) -> Self {
        Self { digest }
    }

    #[must_use]
    pub fn digest(&self) -> &D {
        &self.digest
    }

    /// Build an entry stamped with the current UTC instant.
    ///
    /// # Errors
    /// Returns [`LogError::Validation`] when `action` is blank.
    pub fn build(
        &self,
        action: &str,
        user: Option<&UserIdentity>,
        post_id: Option<&str>,
    ) -> Result<LogEntry, LogError> {
        self.build_at(action, user, post_id, OffsetDateTime::now_utc())
    }

    /// Build an entry stamped with `at`.
    ///
    /// A missing `user` is recorded as the sentinel identity; the event is never
    /// dropped for lack of identity.
    ///
    /// # Errors
    /// Returns [`LogError::Validation`] when `action` is blank or `at` cannot be
    /// rendered.
    pub fn build_at(
        &self,
        action: &str,
        user: Option<&UserIdentity>,
        post_id: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<LogEntry, LogError> {
        if action.trim().is_empty() {
            return Err(LogError::Validation("action MUST be non-empty".to_string()));
        }

        let user = user.cloned().unwrap_or_else(UserIdentity::sentinel);
        let timestamp = timestamp_string(at)?;
        let date = timestamp.split('T').next().unwrap_or_default().to_string();
        let canonical = canonical_text(action, &user, post_id, &timestamp, &date)?;
        let integrity_token = self.digest.digest(&canonical);

        Ok(LogEntry {
            action: action.to_string(),
            user,
            post_id: post_id.map(str::to_string),
            timestamp,
            date,
            integrity_token: Some(integrity_token),
            immutable: true,
            extensions: BTreeMap::new(),
        })
    }

    /// # Errors
    /// Propagates [`LogEntryBuilder::build`] failures.
    pub fn build_check_in(
        &self,
        user: Option<&UserIdentity>,
        post_id: &str,
        acknowledged: bool,
    ) -> Result<LogEntry, LogError> {
        self.build(&check_in_action(post_id, acknowledged), user, Some(post_id))
    }

    /// # Errors
    /// Propagates [`LogEntryBuilder::build`] failures.
    pub fn build_acknowledgment(
        &self,
        user: Option<&UserIdentity>,
        post_id: &str,
    ) -> Result<LogEntry, LogError> {
        self.build(&acknowledgment_action(post_id), user, Some(post_id))
    }

    /// Task ids are recorded in `postId`, the single location field of an entry.
    ///
    /// # Errors
    /// Propagates [`LogEntryBuilder::build`] failures.
    pub fn build_task_completion(
        &self,
        user: Option<&UserIdentity>,
        task_id: &str,
        task_title: &str,
    ) -> Result<LogEntry, LogError> {
        self.build(&task_completion_action(task_title), user, Some(task_id))
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::digest::Sha256Digest;

    fn fixture_time() -> OffsetDateTime {
        // 2025-01-27T14:05:09.123Z
        OffsetDateTime::UNIX_EPOCH + Duration::milliseconds(1_737_986_709_123)
    }

    fn jane() -> UserIdentity {
        UserIdentity::new("Jane Doe", "1234", "Inspector")
    }

    fn build_fixture(
        action: &str,
        user: Option<&UserIdentity>,
        post_id: Option<&str>,
    ) -> LogEntry {
        match LogEntryBuilder::new().build_at(action, user, post_id, fixture_time()) {
            Ok(entry) => entry,
            Err(err) => panic!("fixture entry should build: {err}"),
        }
    }

    #[test]
    fn build_substitutes_sentinel_identity_when_user_is_missing() {
        let entry = build_fixture("Gate opened", None, Some("north-gate"));
        assert_eq!(entry.user(), &UserIdentity::sentinel());
        assert!(entry.user().is_sentinel());
    }

    #[test]
    fn build_rejects_blank_action() {
        let err = LogEntryBuilder::new().build_at("  ", Some(&jane()), None, fixture_time());
        assert_eq!(err, Err(LogError::Validation("action MUST be non-empty".to_string())));
    }

    #[test]
    fn build_stamps_millisecond_utc_timestamp_and_date() {
        let entry = build_fixture("Gate opened", Some(&jane()), None);
        assert_eq!(entry.timestamp(), "2025-01-27T14:05:09.123Z");
        assert_eq!(entry.date(), "2025-01-27");
        assert!(entry.is_immutable());
        assert_eq!(entry.created_at(), Some(fixture_time()));
    }

    #[test]
    fn build_normalizes_non_utc_instants_to_utc() {
        let offset = match UtcOffset::from_hms(-5, 0, 0) {
            Ok(offset) => offset,
            Err(err) => panic!("valid offset: {err}"),
        };
        let late_evening = (fixture_time() + Duration::hours(10)).to_offset(offset);
        let entry = LogEntryBuilder::new()
            .build_at("Gate closed", Some(&jane()), None, late_evening)
            .unwrap_or_else(|err| panic!("entry should build: {err}"));
        assert_eq!(entry.timestamp(), "2025-01-28T00:05:09.123Z");
        assert_eq!(entry.date(), "2025-01-28");
    }

    #[test]
    fn canonical_text_matches_client_serialization() {
        let entry = build_fixture(
            "Checked in to credentialer-entry with acknowledged post orders",
            Some(&jane()),
            Some("credentialer-entry"),
        );
        let canonical = match canonicalize(&entry) {
            Ok(text) => text,
            Err(err) => panic!("canonicalize failed: {err}"),
        };
        assert_eq!(
            canonical,
            r#"{"action":"Checked in to credentialer-entry with acknowledged post orders","user":{"name":"Jane Doe","badge":"1234","position":"Inspector"},"postId":"credentialer-entry","timestamp":"2025-01-27T14:05:09.123Z","date":"2025-01-27"}"#
        );
        assert_eq!(entry.integrity_token(), Some("6d7695bb"));
    }

    #[test]
    fn canonical_text_serializes_absent_post_as_null_and_escapes_text() {
        let at = OffsetDateTime::UNIX_EPOCH + Duration::milliseconds(1_738_022_399_999);
        let entry = match LogEntryBuilder::new().build_at("Shift note \"gate\"\n", None, None, at) {
            Ok(entry) => entry,
            Err(err) => panic!("entry should build: {err}"),
        };
        let canonical = canonicalize(&entry).unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(
            canonical,
            r#"{"action":"Shift note \"gate\"\n","user":{"name":"Unknown","badge":"N/A","position":"N/A"},"postId":null,"timestamp":"2025-01-27T23:59:59.999Z","date":"2025-01-27"}"#
        );
        assert_eq!(entry.integrity_token(), Some("4e9070d"));
    }

    #[test]
    fn derived_builders_compose_fixed_phrases() {
        let builder = LogEntryBuilder::new();
        let acknowledged = builder
            .build_check_in(Some(&jane()), "credentialer-entry", true)
            .unwrap_or_else(|err| panic!("{err}"));
        let unacknowledged = builder
            .build_check_in(Some(&jane()), "credentialer-entry", false)
            .unwrap_or_else(|err| panic!("{err}"));
        let acknowledgment = builder
            .build_acknowledgment(Some(&jane()), "credentialer-entry")
            .unwrap_or_else(|err| panic!("{err}"));
        let task = builder
            .build_task_completion(Some(&jane()), "task-42", "Sweep lane 3")
            .unwrap_or_else(|err| panic!("{err}"));

        assert_eq!(
            acknowledged.action(),
            "Checked in to credentialer-entry with acknowledged post orders"
        );
        assert_eq!(
            unacknowledged.action(),
            "Checked in to credentialer-entry - post orders not acknowledged"
        );
        assert_eq!(acknowledgment.action(), "Acknowledged post orders for credentialer-entry");
        assert_eq!(acknowledgment.post_id(), Some("credentialer-entry"));
        assert_eq!(task.action(), "Completed task: Sweep lane 3");
        assert_eq!(task.post_id(), Some("task-42"));
    }

    #[test]
    fn profile_snapshot_fills_blank_fields_individually() {
        let profile = UserProfile {
            name: "Sam Ortiz".to_string(),
            badge_number: " ".to_string(),
            position: String::new(),
        };
        assert_eq!(profile.identity(), UserIdentity::new("Sam Ortiz", "N/A", "N/A"));
        assert_eq!(UserProfile::default().identity(), UserIdentity::sentinel());
    }

    #[test]
    fn alternate_digest_changes_token_but_not_content() {
        let rolling = build_fixture("Gate opened", Some(&jane()), None);
        let sha = LogEntryBuilder::with_digest(Sha256Digest)
            .build_at("Gate opened", Some(&jane()), None, fixture_time())
            .unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(canonicalize(&rolling), canonicalize(&sha));
        assert_ne!(rolling.integrity_token(), sha.integrity_token());
        assert_eq!(sha.integrity_token().map(str::len), Some(64));
    }

    #[test]
    fn legacy_hash_field_and_extra_fields_are_read_and_preserved() {
        let stored = r#"{
            "action": "Completed task: Sweep lane 3",
            "user": {"name": "Jane Doe", "badge": "1234", "position": "Inspector"},
            "postId": "task-42",
            "timestamp": "2025-01-27T14:05:09.123Z",
            "date": "2025-01-27",
            "hash": "abc123",
            "immutable": true,
            "completionNotes": "cones replaced"
        }"#;
        let entry: LogEntry =
            serde_json::from_str(stored).unwrap_or_else(|err| panic!("legacy entry: {err}"));
        assert_eq!(entry.integrity_token(), Some("abc123"));
        assert_eq!(entry.extension("completionNotes"), Some(&Value::from("cones replaced")));

        let written = serde_json::to_value(&entry).unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(written.get("integrityToken"), Some(&Value::from("abc123")));
        assert_eq!(written.get("completionNotes"), Some(&Value::from("cones replaced")));
        assert!(written.get("hash").is_none());
    }

    #[test]
    fn extensions_ride_outside_the_canonical_content() {
        let entry = build_fixture("Completed task: Sweep lane 3", Some(&jane()), Some("task-42"));
        let annotated = entry
            .clone()
            .with_extension("completionNotes", Value::from("cones replaced"))
            .unwrap_or_else(|err| panic!("extension should attach: {err}"));

        assert_eq!(annotated.extension("completionNotes"), Some(&Value::from("cones replaced")));
        assert_eq!(canonicalize(&annotated), canonicalize(&entry));
        assert_eq!(annotated.integrity_token(), entry.integrity_token());

        for key in ["action", "hash", "integrityToken", " "] {
            let result = entry.clone().with_extension(key, Value::from("x"));
            assert!(matches!(result, Err(LogError::Validation(_))), "{key} should be rejected");
        }
    }
}
