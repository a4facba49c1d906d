//! Reference in-memory store.
//!
//! Backs the test suite and the demonstration runtime. One `Mutex` over the
//! whole dataset supplies the atomicity the traits demand: conditional
//! saves, conditional event claims, and the open-alert uniqueness check all
//! happen under the same lock a database adapter would express as
//! conditional statements and a partial unique index.
//!
//! Events and alerts are keyed by [`TimestampId`] in `BTreeMap`s, so plain
//! key-order iteration is already `created_at`-then-id order.

use chrono::{DateTime, Utc};
use edflow_ids::{RecordId, TimestampId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::alerts::Alert;
use crate::encounter::Encounter;
use crate::events::{EncounterEvent, NewEvent};
use crate::messaging::Message;
use crate::store::{AlertStore, EncounterStore, EventStore, MessageStore, Versioned};
use crate::triage::TriageAssessment;
use crate::{CoreError, CoreResult};

#[derive(Default)]
struct Inner {
    encounters: HashMap<RecordId, (Encounter, u64)>,
    assessments: HashMap<RecordId, Vec<TriageAssessment>>,
    events: BTreeMap<TimestampId, EncounterEvent>,
    last_event_ids: HashMap<RecordId, TimestampId>,
    alerts: BTreeMap<TimestampId, (Alert, u64)>,
    messages: HashMap<RecordId, Vec<Message>>,
}

/// In-memory implementation of every repository trait.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> CoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Storage("memory store mutex poisoned".into()))
    }
}

impl EncounterStore for MemoryStore {
    fn create_encounter(&self, encounter: Encounter) -> CoreResult<()> {
        let mut inner = self.locked()?;
        if inner.encounters.contains_key(&encounter.id) {
            return Err(CoreError::Storage(format!(
                "encounter already exists: {}",
                encounter.id
            )));
        }
        inner.encounters.insert(encounter.id, (encounter, 1));
        Ok(())
    }

    fn load_encounter(&self, id: &RecordId) -> CoreResult<Versioned<Encounter>> {
        let inner = self.locked()?;
        let (encounter, version) =
            inner
                .encounters
                .get(id)
                .ok_or_else(|| CoreError::NotFound {
                    kind: "encounter",
                    id: id.to_string(),
                })?;
        Ok(Versioned {
            value: encounter.clone(),
            version: *version,
        })
    }

    fn save_encounter(&self, encounter: Encounter, expected_version: u64) -> CoreResult<u64> {
        let mut inner = self.locked()?;
        let entry = inner
            .encounters
            .get_mut(&encounter.id)
            .ok_or_else(|| CoreError::NotFound {
                kind: "encounter",
                id: encounter.id.to_string(),
            })?;

        if entry.1 != expected_version {
            return Err(CoreError::ConcurrentModification);
        }

        let new_version = expected_version + 1;
        *entry = (encounter, new_version);
        Ok(new_version)
    }

    fn active_page(&self, offset: usize, limit: usize) -> CoreResult<Vec<Encounter>> {
        let inner = self.locked()?;
        let mut active: Vec<&Encounter> = inner
            .encounters
            .values()
            .map(|(encounter, _)| encounter)
            .filter(|encounter| !encounter.status.is_terminal())
            .collect();
        active.sort_by_key(|encounter| encounter.id);

        Ok(active
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn record_assessment_and_advance(
        &self,
        assessment: TriageAssessment,
        expected_version: u64,
    ) -> CoreResult<u64> {
        let mut inner = self.locked()?;

        // Version check first: nothing is written unless both writes can land.
        let (encounter, version) = inner
            .encounters
            .get(&assessment.encounter_id)
            .ok_or_else(|| CoreError::NotFound {
                kind: "encounter",
                id: assessment.encounter_id.to_string(),
            })?;
        if *version != expected_version {
            return Err(CoreError::ConcurrentModification);
        }

        let mut encounter = encounter.clone();
        encounter.current_assessment_id = Some(assessment.id.clone());
        encounter.current_ctas_level = Some(assessment.ctas_level);
        encounter.current_priority_score = Some(assessment.priority_score);

        let new_version = expected_version + 1;
        let encounter_id = assessment.encounter_id;
        inner
            .assessments
            .entry(encounter_id)
            .or_default()
            .push(assessment);
        inner
            .encounters
            .insert(encounter_id, (encounter, new_version));
        Ok(new_version)
    }

    fn assessments_for(&self, encounter_id: &RecordId) -> CoreResult<Vec<TriageAssessment>> {
        let inner = self.locked()?;
        Ok(inner
            .assessments
            .get(encounter_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl EventStore for MemoryStore {
    fn append_event(&self, event: NewEvent, now: DateTime<Utc>) -> CoreResult<EncounterEvent> {
        let mut inner = self.locked()?;

        let id = TimestampId::generate(now, inner.last_event_ids.get(&event.encounter_id));
        inner
            .last_event_ids
            .insert(event.encounter_id, id.clone());

        let row = EncounterEvent {
            // created_at mirrors the id's timestamp so the two orderings agree
            // even when the monotonic bump outran the supplied clock.
            created_at: id.timestamp(),
            id: id.clone(),
            encounter_id: event.encounter_id,
            hospital_id: event.hospital_id,
            event_type: event.event_type,
            metadata: event.metadata,
            processed_at: None,
            claimed_until: None,
        };
        inner.events.insert(id, row.clone());
        Ok(row)
    }

    fn claim_unprocessed(
        &self,
        batch_size: usize,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> CoreResult<Vec<EncounterEvent>> {
        let mut inner = self.locked()?;
        let mut claimed = Vec::new();

        for event in inner.events.values_mut() {
            if claimed.len() == batch_size {
                break;
            }
            if event.is_processed() || event.is_claimed(now) {
                continue;
            }
            event.claimed_until = Some(lease_until);
            claimed.push(event.clone());
        }

        Ok(claimed)
    }

    fn mark_processed(&self, id: &TimestampId, now: DateTime<Utc>) -> CoreResult<()> {
        let mut inner = self.locked()?;
        let event = inner.events.get_mut(id).ok_or_else(|| CoreError::NotFound {
            kind: "event",
            id: id.to_string(),
        })?;

        if event.is_processed() {
            return Ok(());
        }
        event.processed_at = Some(now);
        event.claimed_until = None;
        Ok(())
    }

    fn events_for(&self, encounter_id: &RecordId) -> CoreResult<Vec<EncounterEvent>> {
        let inner = self.locked()?;
        Ok(inner
            .events
            .values()
            .filter(|event| event.encounter_id == *encounter_id)
            .cloned()
            .collect())
    }
}

impl AlertStore for MemoryStore {
    fn insert_if_none_open(&self, alert: Alert) -> CoreResult<bool> {
        let mut inner = self.locked()?;

        let open_exists = inner.alerts.values().any(|(existing, _)| {
            existing.encounter_id == alert.encounter_id
                && existing.alert_type == alert.alert_type
                && existing.is_open()
        });
        if open_exists {
            return Ok(false);
        }

        inner.alerts.insert(alert.id.clone(), (alert, 1));
        Ok(true)
    }

    fn load_alert(&self, id: &TimestampId) -> CoreResult<Versioned<Alert>> {
        let inner = self.locked()?;
        let (alert, version) = inner.alerts.get(id).ok_or_else(|| CoreError::NotFound {
            kind: "alert",
            id: id.to_string(),
        })?;
        Ok(Versioned {
            value: alert.clone(),
            version: *version,
        })
    }

    fn save_alert(&self, alert: Alert, expected_version: u64) -> CoreResult<u64> {
        let mut inner = self.locked()?;
        let entry = inner
            .alerts
            .get_mut(&alert.id)
            .ok_or_else(|| CoreError::NotFound {
                kind: "alert",
                id: alert.id.to_string(),
            })?;

        if entry.1 != expected_version {
            return Err(CoreError::ConcurrentModification);
        }

        let new_version = expected_version + 1;
        *entry = (alert, new_version);
        Ok(new_version)
    }

    fn open_alerts_for(&self, encounter_id: &RecordId) -> CoreResult<Vec<Alert>> {
        let inner = self.locked()?;
        Ok(inner
            .alerts
            .values()
            .map(|(alert, _)| alert)
            .filter(|alert| alert.encounter_id == *encounter_id && alert.is_open())
            .cloned()
            .collect())
    }
}

impl MessageStore for MemoryStore {
    fn append_message(&self, message: Message) -> CoreResult<()> {
        let mut inner = self.locked()?;
        inner
            .messages
            .entry(message.encounter_id)
            .or_default()
            .push(message);
        Ok(())
    }

    fn messages_for(&self, encounter_id: &RecordId) -> CoreResult<Vec<Message>> {
        let inner = self.locked()?;
        let mut thread = inner
            .messages
            .get(encounter_id)
            .cloned()
            .unwrap_or_default();
        thread.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertSeverity, AlertType};
    use crate::events::EventType;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
    }

    fn encounter() -> Encounter {
        Encounter::register(RecordId::new(), RecordId::new(), None, t(0))
    }

    fn alert_for(encounter_id: RecordId, at: DateTime<Utc>) -> Alert {
        Alert {
            id: TimestampId::generate(at, None),
            encounter_id,
            hospital_id: None,
            alert_type: AlertType::TriageReassessmentOverdue,
            severity: AlertSeverity::Medium,
            metadata: json!({}),
            created_at: at,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolved_by: None,
        }
    }

    #[test]
    fn create_rejects_duplicate_encounter() {
        let store = MemoryStore::new();
        let e = encounter();
        store.create_encounter(e.clone()).unwrap();
        assert!(matches!(
            store.create_encounter(e),
            Err(CoreError::Storage(_))
        ));
    }

    #[test]
    fn save_bumps_version_and_rejects_stale_writers() {
        let store = MemoryStore::new();
        let e = encounter();
        store.create_encounter(e.clone()).unwrap();

        let loaded = store.load_encounter(&e.id).unwrap();
        assert_eq!(loaded.version, 1);

        let v2 = store.save_encounter(e.clone(), 1).unwrap();
        assert_eq!(v2, 2);

        // The same expected version cannot win twice.
        assert!(matches!(
            store.save_encounter(e, 1),
            Err(CoreError::ConcurrentModification)
        ));
    }

    #[test]
    fn active_page_skips_terminal_and_respects_bounds() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            store.create_encounter(encounter()).unwrap();
        }
        let mut done = encounter();
        done.apply(crate::EncounterAction::Cancel, t(1)).unwrap();
        store.create_encounter(done).unwrap();

        let first = store.active_page(0, 3).unwrap();
        let second = store.active_page(3, 3).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);

        let mut ids: Vec<_> = first.iter().chain(&second).map(|e| e.id).collect();
        let sorted = {
            let mut s = ids.clone();
            s.sort();
            s
        };
        assert_eq!(ids.len(), 5);
        ids.dedup();
        assert_eq!(ids.len(), 5, "pages must not overlap");
        assert_eq!(ids, sorted, "pages walk a stable id order");
    }

    #[test]
    fn record_assessment_is_both_or_neither_on_version_conflict() {
        let store = MemoryStore::new();
        let e = encounter();
        store.create_encounter(e.clone()).unwrap();

        let assessment = TriageAssessment {
            id: TimestampId::generate(t(1), None),
            encounter_id: e.id,
            hospital_id: None,
            created_by: crate::ActorId::new("nurse-1").unwrap(),
            ctas_level: edflow_types::CtasLevel::new(2).unwrap(),
            priority_score: edflow_types::PriorityScore::new(50.0).unwrap(),
            note: None,
            vital_signs: json!({}),
            created_at: t(1),
        };

        let err = store
            .record_assessment_and_advance(assessment.clone(), 99)
            .unwrap_err();
        assert!(matches!(err, CoreError::ConcurrentModification));

        // Neither the row nor the pointer moved.
        assert!(store.assessments_for(&e.id).unwrap().is_empty());
        let stored = store.load_encounter(&e.id).unwrap().value;
        assert!(stored.current_assessment_id.is_none());

        let v2 = store.record_assessment_and_advance(assessment, 1).unwrap();
        assert_eq!(v2, 2);
        let stored = store.load_encounter(&e.id).unwrap().value;
        assert!(stored.current_assessment_id.is_some());
    }

    #[test]
    fn concurrent_claimers_never_share_an_event() {
        let store = Arc::new(MemoryStore::new());
        let encounter_id = RecordId::new();
        for _ in 0..40 {
            store
                .append_event(
                    NewEvent {
                        encounter_id,
                        hospital_id: None,
                        event_type: EventType::StatusChanged,
                        metadata: json!({}),
                    },
                    t(0),
                )
                .unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                let mut mine = Vec::new();
                for _ in 0..5 {
                    mine.extend(
                        store
                            .claim_unprocessed(3, t(1), t(10))
                            .unwrap()
                            .into_iter()
                            .map(|e| e.id),
                    );
                }
                mine
            }));
        }

        let mut all: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("claimer thread panicked"))
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total, "an event was claimed by two threads");
        assert_eq!(total, 40);
    }

    #[test]
    fn concurrent_scans_insert_exactly_one_open_alert() {
        let store = Arc::new(MemoryStore::new());
        let encounter_id = RecordId::new();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                store
                    .insert_if_none_open(alert_for(encounter_id, t(i)))
                    .unwrap()
            }));
        }

        let inserted = handles
            .into_iter()
            .map(|h| h.join().expect("insert thread panicked"))
            .filter(|inserted| *inserted)
            .count();
        assert_eq!(inserted, 1);
        assert_eq!(store.open_alerts_for(&encounter_id).unwrap().len(), 1);
    }

    #[test]
    fn messages_sort_by_time_then_id() {
        let store = MemoryStore::new();
        let e = encounter();
        store.create_encounter(e.clone()).unwrap();

        let author = crate::ActorId::new("nurse-1").unwrap();
        let later = Message {
            id: TimestampId::generate(t(5), None),
            encounter_id: e.id,
            author: author.clone(),
            body: edflow_types::NonEmptyText::new("later").unwrap(),
            created_at: t(5),
        };
        let earlier = Message {
            id: TimestampId::generate(t(1), None),
            encounter_id: e.id,
            author,
            body: edflow_types::NonEmptyText::new("earlier").unwrap(),
            created_at: t(1),
        };

        // Appended out of order; read back in order.
        store.append_message(later).unwrap();
        store.append_message(earlier).unwrap();

        let thread = store.messages_for(&e.id).unwrap();
        assert_eq!(thread[0].body.as_str(), "earlier");
        assert_eq!(thread[1].body.as_str(), "later");
    }
}
