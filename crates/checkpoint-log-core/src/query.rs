use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::entry::{date_string, LogCollection, LogEntry, UNKNOWN_FIELD};
use crate::store::LogKind;
use crate::LogError;

/// Conjunctive filter over a collection. Absent or empty fields impose no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    pub search_term: Option<String>,
    pub date: Option<String>,
    pub user_badge: Option<String>,
}

impl LogFilter {
    #[must_use]
    pub fn by_badge(badge: impl Into<String>) -> Self {
        Self { user_badge: Some(badge.into()), ..Self::default() }
    }

    #[must_use]
    pub fn by_date(date: impl Into<String>) -> Self {
        Self { date: Some(date.into()), ..Self::default() }
    }

    #[must_use]
    pub fn by_search(term: impl Into<String>) -> Self {
        Self { search_term: Some(term.into()), ..Self::default() }
    }

    fn matches(&self, entry: &LogEntry, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            let user = entry.user();
            let hit = [user.name.as_str(), user.badge.as_str(), entry.action()]
                .into_iter()
                .chain(entry.post_id())
                .any(|field| field.to_lowercase().contains(needle));
            if !hit {
                return false;
            }
        }

        if let Some(date) = non_empty(self.date.as_deref()) {
            if entry.date() != date {
                return false;
            }
        }

        if let Some(badge) = non_empty(self.user_badge.as_deref()) {
            if entry.user().badge != badge {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogSummaryStats {
    pub total: usize,
    pub today_count: usize,
    pub unique_user_count: usize,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// Entries matching every present predicate of `criteria`, in original order.
#[must_use]
pub fn filter(entries: &[LogEntry], criteria: &LogFilter) -> LogCollection {
    let needle = non_empty(criteria.search_term.as_deref()).map(str::to_lowercase);
    entries.iter().filter(|entry| criteria.matches(entry, needle.as_deref())).cloned().collect()
}

#[must_use]
pub fn todays(entries: &[LogEntry], today: &str) -> LogCollection {
    filter(entries, &LogFilter::by_date(today))
}

/// Calendar date in the process's local offset, falling back to UTC when the
/// local offset cannot be determined.
#[must_use]
pub fn local_today() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "local offset unavailable; using UTC date");
        OffsetDateTime::now_utc()
    });
    date_string(now).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to format local date");
        String::new()
    })
}

/// Distinct badges, excluding the sentinel badge.
#[must_use]
pub fn unique_users(entries: &[LogEntry]) -> BTreeSet<String> {
    entries
        .iter()
        .map(|entry| entry.user().badge.as_str())
        .filter(|badge| *badge != UNKNOWN_FIELD)
        .map(str::to_string)
        .collect()
}

/// Distinct dates, most recent first.
#[must_use]
pub fn unique_dates(entries: &[LogEntry]) -> Vec<String> {
    let dates: BTreeSet<&str> = entries.iter().map(LogEntry::date).collect();
    dates.into_iter().rev().map(str::to_string).collect()
}

#[must_use]
pub fn summary_stats(entries: &[LogEntry], today: &str) -> LogSummaryStats {
    LogSummaryStats {
        total: entries.len(),
        today_count: entries.iter().filter(|entry| entry.date() == today).count(),
        unique_user_count: unique_users(entries).len(),
    }
}

/// Copy of `entries` ordered by creation instant, newest first. Entries with
/// unparseable timestamps sort last; ties keep their original order.
#[must_use]
pub fn newest_first(entries: &[LogEntry]) -> LogCollection {
    let mut keyed: Vec<(Option<OffsetDateTime>, &LogEntry)> =
        entries.iter().map(|entry| (entry.created_at(), entry)).collect();
    keyed.sort_by(|(lhs, _), (rhs, _)| match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => rhs.cmp(lhs),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().map(|(_, entry)| entry.clone()).collect()
}

/// Pretty-printed JSON array for offline audit download.
///
/// # Errors
/// Returns [`LogError::Serialization`] when an entry cannot be encoded.
pub fn export(entries: &[LogEntry]) -> Result<String, LogError> {
    serde_json::to_string_pretty(entries)
        .map_err(|err| LogError::Serialization(format!("failed to export log entries: {err}")))
}

/// Parse an exported or persisted JSON array of entries.
///
/// # Errors
/// Returns [`LogError::Serialization`] when `text` is not a JSON array of entries.
pub fn parse(text: &str) -> Result<LogCollection, LogError> {
    serde_json::from_str(text)
        .map_err(|err| LogError::Serialization(format!("failed to parse log entries: {err}")))
}

#[must_use]
pub fn export_file_name(kind: LogKind, date: &str) -> String {
    format!("{}-{date}.json", kind.export_prefix())
}

/// One-line human-readable rendering in the given offset:
/// `"1/27/2025 2:05:09 PM - Jane Doe (Badge #1234) <action>"`.
#[must_use]
pub fn summary_line(entry: &LogEntry, offset: UtcOffset) -> String {
    let when = entry
        .created_at()
        .and_then(|at| {
            at.to_offset(offset)
                .format(format_description!(
                    "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute]:[second] [period]"
                ))
                .ok()
        })
        .unwrap_or_else(|| entry.timestamp().to_string());
    let user = entry.user();
    format!("{when} - {} (Badge #{}) {}", user.name, user.badge, entry.action())
}
