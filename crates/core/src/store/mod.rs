//! Repository boundary for the core.
//!
//! The core never touches a database session or an object graph; it sees only
//! these narrow traits. Load operations on mutable rows return a
//! [`Versioned`] wrapper and saves are conditional on the expected version,
//! which is how concurrent staff actions on the same encounter are resolved
//! (see [`crate::CoreError::ConcurrentModification`]).
//!
//! Three operations carry atomicity requirements beyond plain load/save, and
//! every implementation must honour them:
//! - [`EncounterStore::record_assessment_and_advance`]: assessment insert and
//!   current-pointer advance are both-or-neither.
//! - [`EventStore::claim_unprocessed`]: two concurrent callers never receive
//!   the same event inside a lease window.
//! - [`AlertStore::insert_if_none_open`]: the open-alert check and the insert
//!   are one atomic unit per (encounter, type).
//!
//! [`memory::MemoryStore`] is the reference implementation; a database
//! adapter implements the same traits with a unique partial index (or
//! equivalent conditional statements) in place of the process-local lock.

pub mod memory;

use chrono::{DateTime, Utc};
use edflow_ids::{RecordId, TimestampId};

use crate::alerts::Alert;
use crate::encounter::Encounter;
use crate::events::{EncounterEvent, NewEvent};
use crate::messaging::Message;
use crate::triage::TriageAssessment;
use crate::CoreResult;

/// A stored row together with its optimistic-concurrency version.
#[derive(Clone, Debug)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// Load/save operations for the encounter aggregate root, plus the atomic
/// assessment append.
pub trait EncounterStore: Send + Sync {
    /// Persists a freshly registered encounter at version 1.
    fn create_encounter(&self, encounter: Encounter) -> CoreResult<()>;

    /// Loads an encounter with its current version.
    fn load_encounter(&self, id: &RecordId) -> CoreResult<Versioned<Encounter>>;

    /// Saves an encounter if its stored version still equals
    /// `expected_version`; returns the new version.
    fn save_encounter(&self, encounter: Encounter, expected_version: u64) -> CoreResult<u64>;

    /// Returns a page of encounters in non-terminal status, ordered by id.
    ///
    /// Paging bounds scan memory; callers walk pages until one comes back
    /// short or empty.
    fn active_page(&self, offset: usize, limit: usize) -> CoreResult<Vec<Encounter>>;

    /// Inserts the assessment row and advances the encounter's
    /// current-assessment pointer as a single atomic unit, conditional on
    /// `expected_version`. Returns the new encounter version.
    ///
    /// A reader must never observe the pointer referencing a missing or
    /// stale assessment.
    fn record_assessment_and_advance(
        &self,
        assessment: TriageAssessment,
        expected_version: u64,
    ) -> CoreResult<u64>;

    /// All assessments for an encounter, oldest first.
    fn assessments_for(&self, encounter_id: &RecordId) -> CoreResult<Vec<TriageAssessment>>;
}

/// Append-only event log with lease-based claim semantics.
pub trait EventStore: Send + Sync {
    /// Appends an event, allocating an identifier that orders after every
    /// event previously appended for the same encounter.
    fn append_event(&self, event: NewEvent, now: DateTime<Utc>) -> CoreResult<EncounterEvent>;

    /// Atomically claims up to `batch_size` unprocessed events whose lease
    /// has not been taken (or has expired), marking each claimed until
    /// `lease_until`.
    fn claim_unprocessed(
        &self,
        batch_size: usize,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> CoreResult<Vec<EncounterEvent>>;

    /// Marks an event processed. Idempotent: a second call is a no-op.
    fn mark_processed(&self, id: &TimestampId, now: DateTime<Utc>) -> CoreResult<()>;

    /// All events for an encounter, in id order.
    fn events_for(&self, encounter_id: &RecordId) -> CoreResult<Vec<EncounterEvent>>;
}

/// Alert rows with the per-(encounter, type) open-alert uniqueness guarantee.
pub trait AlertStore: Send + Sync {
    /// Inserts `alert` unless an open alert of the same type already exists
    /// for the encounter. Returns whether the insert happened.
    ///
    /// Check and insert are one atomic unit, so two concurrent scan passes
    /// cannot double-alert.
    fn insert_if_none_open(&self, alert: Alert) -> CoreResult<bool>;

    /// Loads an alert with its current version.
    fn load_alert(&self, id: &TimestampId) -> CoreResult<Versioned<Alert>>;

    /// Saves an alert if its stored version still equals `expected_version`;
    /// returns the new version.
    fn save_alert(&self, alert: Alert, expected_version: u64) -> CoreResult<u64>;

    /// Open (unresolved) alerts for an encounter.
    fn open_alerts_for(&self, encounter_id: &RecordId) -> CoreResult<Vec<Alert>>;
}

/// Append-only per-encounter message thread.
pub trait MessageStore: Send + Sync {
    fn append_message(&self, message: Message) -> CoreResult<()>;

    /// Messages for an encounter, ordered by `created_at` then id.
    fn messages_for(&self, encounter_id: &RecordId) -> CoreResult<Vec<Message>>;
}
