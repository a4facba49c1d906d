//! Per-encounter message thread.
//!
//! Append-only: messages are never edited or deleted, and the thread reads
//! back ordered by `created_at` with the id as tiebreak.

use chrono::{DateTime, Utc};
use edflow_ids::{RecordId, TimestampId};
use edflow_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::actor::ActorId;
use crate::store::{EncounterStore, MessageStore};
use crate::CoreResult;

/// One message in an encounter's thread.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: TimestampId,
    pub encounter_id: RecordId,
    pub author: ActorId,
    pub body: NonEmptyText,
    pub created_at: DateTime<Utc>,
}

/// Append and read operations for encounter message threads.
#[derive(Clone)]
pub struct MessagingLog {
    encounters: Arc<dyn EncounterStore>,
    messages: Arc<dyn MessageStore>,
}

impl MessagingLog {
    pub fn new(encounters: Arc<dyn EncounterStore>, messages: Arc<dyn MessageStore>) -> Self {
        Self {
            encounters,
            messages,
        }
    }

    /// Posts a message to an encounter's thread.
    ///
    /// The encounter must exist; terminal encounters still accept messages
    /// (discharge follow-ups are routine).
    pub fn post(
        &self,
        encounter_id: RecordId,
        author: ActorId,
        body: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Message> {
        let body = NonEmptyText::new(body)?;
        self.encounters.load_encounter(&encounter_id)?;

        let message = Message {
            id: TimestampId::generate(now, None),
            encounter_id,
            author,
            body,
            created_at: now,
        };
        self.messages.append_message(message.clone())?;
        Ok(message)
    }

    /// The encounter's thread, oldest first.
    pub fn thread(&self, encounter_id: &RecordId) -> CoreResult<Vec<Message>> {
        self.messages.messages_for(encounter_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::{CoreError, Encounter};
    use chrono::TimeZone;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
    }

    fn setup() -> (MessagingLog, Arc<MemoryStore>, RecordId) {
        let store = Arc::new(MemoryStore::new());
        let encounter = Encounter::register(RecordId::new(), RecordId::new(), None, t(0));
        let id = encounter.id;
        store.create_encounter(encounter).unwrap();
        (MessagingLog::new(store.clone(), store.clone()), store, id)
    }

    #[test]
    fn thread_reads_back_in_chronological_order() {
        let (log, _, encounter_id) = setup();
        let staff = ActorId::new("nurse-2").unwrap();
        let patient = ActorId::new("patient-77").unwrap();

        log.post(encounter_id, patient.clone(), "On my way, ETA 10 minutes", t(1))
            .unwrap();
        log.post(encounter_id, staff.clone(), "Noted, check in at the desk", t(3))
            .unwrap();
        log.post(encounter_id, patient, "Here now", t(9)).unwrap();

        let thread = log.thread(&encounter_id).unwrap();
        assert_eq!(thread.len(), 3);
        assert!(thread.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert_eq!(thread[1].author, staff);
        assert_eq!(thread[2].body.as_str(), "Here now");
    }

    #[test]
    fn same_instant_messages_keep_a_stable_order() {
        let (log, _, encounter_id) = setup();
        let author = ActorId::new("nurse-2").unwrap();

        let first = log.post(encounter_id, author.clone(), "first", t(1)).unwrap();
        let second = log.post(encounter_id, author, "second", t(1)).unwrap();

        let thread = log.thread(&encounter_id).unwrap();
        assert_eq!(thread.len(), 2);
        // Ties on created_at break on id, so the read order is deterministic.
        if first.id < second.id {
            assert_eq!(thread[0].id, first.id);
        } else {
            assert_eq!(thread[0].id, second.id);
        }
    }

    #[test]
    fn blank_body_is_rejected() {
        let (log, _, encounter_id) = setup();
        let err = log
            .post(encounter_id, ActorId::new("nurse-2").unwrap(), "   ", t(1))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn unknown_encounter_is_not_found() {
        let (log, _, _) = setup();
        let err = log
            .post(RecordId::new(), ActorId::new("nurse-2").unwrap(), "hello", t(1))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
