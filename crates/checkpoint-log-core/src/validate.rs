use serde::{Deserialize, Serialize};

use crate::digest::{DigestFunction, RollingDigest};
use crate::entry::{canonicalize, LogEntry};

/// Per-entry verification outcome, keyed by position in the collection.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub position: usize,
    pub integrity_token: Option<String>,
    pub valid: bool,
}

/// Recompute the integrity token of `entry` with the default digest and compare.
#[must_use]
pub fn validate(entry: &LogEntry) -> bool {
    validate_with(entry, &RollingDigest)
}

/// Returns `false` when the entry has no token, is not flagged immutable, or
/// its content no longer hashes to the stored token. Mismatches are reported,
/// never raised.
#[must_use]
pub fn validate_with<D: DigestFunction>(entry: &LogEntry, digest: &D) -> bool {
    let Some(stored) = entry.integrity_token() else {
        return false;
    };
    if !entry.is_immutable() {
        return false;
    }

    match canonicalize(entry) {
        Ok(canonical) => digest.digest(&canonical) == stored,
        Err(err) => {
            tracing::debug!(error = %err, "entry could not be canonicalized for validation");
            false
        }
    }
}

#[must_use]
pub fn verify_collection<D: DigestFunction>(entries: &[LogEntry], digest: &D) -> Vec<Verification> {
    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| Verification {
            position,
            integrity_token: entry.integrity_token().map(str::to_string),
            valid: validate_with(entry, digest),
        })
        .collect()
}
