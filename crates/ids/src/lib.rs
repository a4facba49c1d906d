//! Identifier types for EDFLOW records.
//!
//! EDFLOW keys every stored row by an opaque identifier. To keep identifier
//! handling deterministic and consistent across the codebase, two forms are
//! used:
//!
//! - [`RecordId`]: a *canonical* UUID representation (**32 lowercase
//!   hexadecimal characters**, no hyphens) for aggregate roots (encounters,
//!   patients, hospitals, staff).
//! - [`TimestampId`]: a time-prefixed identifier for append-only child rows
//!   (events, assessments, alerts, messages). Its string form sorts
//!   chronologically, so "order by created_at, then id" and "order by id"
//!   agree, with the embedded UUID breaking ties.
//!
//! ## Canonical id form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! This is the same value you would get from
//! `Uuid::new_v4().simple().to_string()`. Externally supplied identifiers
//! (from CLI/API inputs) must already be canonical; use [`RecordId::parse`]
//! to validate them. Non-canonical values (uppercase, hyphenated, wrong
//! length, non-hex) are rejected.
//!
//! ## Time handling
//! Generation never reads the wall clock. Callers supply `now`, which keeps
//! identifier ordering reproducible in tests and pins every id to the same
//! clock the rest of the system uses.

use chrono::{DateTime, Duration, Utc};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use uuid::Uuid;

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;

/// EDFLOW's canonical record identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed to be in canonical
/// form, so it can be compared, stored, and displayed without re-validation.
///
/// # Construction
/// - [`RecordId::new`] allocates a fresh identifier (new encounters, patients).
/// - [`RecordId::parse`] validates an externally supplied identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generates a new identifier in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// This does **not** normalise other common UUID forms (hyphenated or
    /// uppercase); callers must provide the canonical representation.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is not canonical.
    pub fn parse(input: &str) -> IdResult<Self> {
        if Self::is_canonical(input) {
            // SAFETY: is_canonical guarantees valid hex, so parse_str will succeed
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(IdError::InvalidInput(format!(
            "record id must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes, lowercase hex only.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A time-prefixed identifier for append-only rows.
///
/// Format:
/// `YYYYMMDDTHHMMSS.mmmZ-<canonical_uuid>`
///
/// Example:
/// `20260111T143522.045Z-550e8400e29b41d4a716446655440000`
///
/// This identifier is:
/// - Globally unique (UUID suffix)
/// - Human-readable
/// - Chronologically sortable as a string
/// - Monotonic per encounter when generated with the previous id
///
/// # Monotonicity
///
/// When [`TimestampId::generate`] is given the previous id for the same
/// encounter, the timestamp component is guaranteed to be strictly greater
/// (bumped by at least 1 ms if the clock has not advanced). Two events
/// appended back-to-back within the same millisecond therefore still order
/// correctly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimestampId {
    timestamp: DateTime<Utc>,
    id: RecordId,
}

impl TimestampId {
    /// Generate a new timestamp id.
    ///
    /// `now` is the caller's clock reading. If `last` is provided, the
    /// timestamp component is strictly greater than the last one.
    ///
    /// Designed to be called while holding whatever exclusion the store
    /// provides for the encounter's append sequence.
    pub fn generate(now: DateTime<Utc>, last: Option<&TimestampId>) -> Self {
        let timestamp = match last {
            Some(prev) if now <= prev.timestamp => prev.timestamp + Duration::milliseconds(1),
            _ => now,
        };

        Self {
            timestamp,
            id: RecordId::new(),
        }
    }

    /// Returns the timestamp component.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the UUID component.
    pub fn record_id(&self) -> RecordId {
        self.id
    }
}

impl PartialOrd for TimestampId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimestampId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl FromStr for TimestampId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts_str, id_str) = s
            .split_once('-')
            .ok_or_else(|| IdError::InvalidInput(format!("invalid timestamp id format: '{}'", s)))?;

        if !ts_str.ends_with('Z') {
            return Err(IdError::InvalidInput(format!(
                "timestamp must end with 'Z': '{}'",
                ts_str
            )));
        }

        let ts_no_z = &ts_str[..ts_str.len() - 1];
        let naive =
            chrono::NaiveDateTime::parse_from_str(ts_no_z, "%Y%m%dT%H%M%S%.3f").map_err(|e| {
                IdError::InvalidInput(format!("invalid timestamp format '{}': {}", ts_str, e))
            })?;

        let timestamp = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
        let id = RecordId::parse(id_str)?;

        Ok(Self { timestamp, id })
    }
}

impl fmt::Display for TimestampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.timestamp.format("%Y%m%dT%H%M%S%.3fZ"),
            self.id
        )
    }
}

impl serde::Serialize for TimestampId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for TimestampId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TimestampId::from_str(&s).map_err(serde::de::Error::custom)
    }
}
