//! Append-only encounter event log.
//!
//! Domain occurrences are recorded as immutable [`EncounterEvent`] rows. A
//! row changes at most twice after the append: once when a consumer claims
//! it (a lease, not a permanent flag) and once when processing completes
//! (`processed_at`, set exactly once).
//!
//! Delivery is at-least-once: a consumer that crashes after claiming loses
//! its lease on expiry and the event returns to the unprocessed pool.
//! Consumers must therefore be idempotent with respect to the event's id.

use chrono::{DateTime, Duration, Utc};
use edflow_ids::{RecordId, TimestampId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::EventStore;
use crate::CoreResult;

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    EncounterCreated,
    StatusChanged,
    AssessmentRecorded,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::EncounterCreated => "ENCOUNTER_CREATED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::AssessmentRecorded => "ASSESSMENT_RECORDED",
        };
        write!(f, "{name}")
    }
}

/// A domain occurrence tied to an encounter. Immutable once written, except
/// for the claim lease and the one-shot `processed_at` marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterEvent {
    pub id: TimestampId,
    pub encounter_id: RecordId,
    pub hospital_id: Option<RecordId>,
    pub event_type: EventType,
    /// Opaque structured payload; shape is owned by the producer.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, by exactly one processor.
    pub processed_at: Option<DateTime<Utc>>,
    /// Claim lease. An event is available when this is unset or in the past.
    pub claimed_until: Option<DateTime<Utc>>,
}

impl EncounterEvent {
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    /// Whether a live claim exists at `now`.
    pub fn is_claimed(&self, now: DateTime<Utc>) -> bool {
        self.claimed_until.is_some_and(|until| until > now)
    }
}

/// Fields the producer supplies; the store allocates id and timestamps.
#[derive(Clone, Debug)]
pub struct NewEvent {
    pub encounter_id: RecordId,
    pub hospital_id: Option<RecordId>,
    pub event_type: EventType,
    pub metadata: serde_json::Value,
}

/// Append/claim/process operations over the event store, carrying the
/// configured lease duration.
#[derive(Clone)]
pub struct EventLog {
    store: Arc<dyn EventStore>,
    lease: Duration,
}

impl EventLog {
    pub fn new(store: Arc<dyn EventStore>, lease: Duration) -> Self {
        Self { store, lease }
    }

    /// Appends an event. Always succeeds against a healthy store; returns
    /// the allocated id, which orders after every earlier event of the same
    /// encounter.
    pub fn append(
        &self,
        encounter_id: RecordId,
        hospital_id: Option<RecordId>,
        event_type: EventType,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> CoreResult<TimestampId> {
        let event = self.store.append_event(
            NewEvent {
                encounter_id,
                hospital_id,
                event_type,
                metadata,
            },
            now,
        )?;

        tracing::debug!(
            encounter = %event.encounter_id,
            event = %event.event_type,
            id = %event.id,
            "event appended"
        );
        Ok(event.id)
    }

    /// Claims up to `batch_size` unprocessed events under a lease of the
    /// configured duration. Events whose earlier lease expired are handed
    /// out again.
    pub fn claim_unprocessed(
        &self,
        batch_size: usize,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<EncounterEvent>> {
        self.store.claim_unprocessed(batch_size, now, now + self.lease)
    }

    /// Marks an event processed. Calling it twice is a no-op on the second
    /// call, never an error.
    pub fn mark_processed(&self, id: &TimestampId, now: DateTime<Utc>) -> CoreResult<()> {
        self.store.mark_processed(id, now)
    }
}
