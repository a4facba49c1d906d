//! Triage assessment recording.
//!
//! An encounter accumulates assessments over its visit; only the latest is
//! "current". The current-pointer fields on the encounter are denormalized
//! for fast reads and are advanced in the same atomic repository operation
//! that inserts the assessment row, so a reader can never observe a pointer
//! to a missing or stale assessment.

use chrono::{DateTime, Utc};
use edflow_ids::{RecordId, TimestampId};
use edflow_types::{CtasLevel, PriorityScore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::actor::ActorId;
use crate::events::{EventLog, EventType};
use crate::store::EncounterStore;
use crate::{CoreError, CoreResult};

/// One triage exam. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriageAssessment {
    pub id: TimestampId,
    pub encounter_id: RecordId,
    pub hospital_id: Option<RecordId>,
    pub created_by: ActorId,
    pub ctas_level: CtasLevel,
    pub priority_score: PriorityScore,
    pub note: Option<String>,
    /// Opaque structured payload; shape owned by the assessing tooling.
    pub vital_signs: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Records assessments and advances the encounter's current pointer.
#[derive(Clone)]
pub struct TriageService {
    encounters: Arc<dyn EncounterStore>,
    events: EventLog,
}

impl TriageService {
    pub fn new(encounters: Arc<dyn EncounterStore>, events: EventLog) -> Self {
        Self { encounters, events }
    }

    /// Records a triage assessment against an encounter.
    ///
    /// Validates the clinical fields, rejects terminal encounters, then
    /// inserts the row and advances the current pointer as one atomic unit.
    /// An `ASSESSMENT_RECORDED` event is appended afterwards.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] for a CTAS level outside 1-5 or a
    ///   negative/non-finite priority score (rejected before any write)
    /// - [`CoreError::NotFound`] if the encounter does not exist
    /// - [`CoreError::InvalidState`] if the encounter is terminal
    /// - [`CoreError::ConcurrentModification`] if the encounter changed
    ///   between load and save
    #[allow(clippy::too_many_arguments)]
    pub fn record_assessment(
        &self,
        encounter_id: RecordId,
        ctas_level: u8,
        priority_score: f64,
        note: Option<String>,
        vital_signs: serde_json::Value,
        by: ActorId,
        now: DateTime<Utc>,
    ) -> CoreResult<TriageAssessment> {
        let ctas_level = CtasLevel::new(ctas_level)?;
        let priority_score = PriorityScore::new(priority_score)?;

        let loaded = self.encounters.load_encounter(&encounter_id)?;
        if loaded.value.status.is_terminal() {
            return Err(CoreError::InvalidState {
                status: loaded.value.status,
            });
        }

        let assessment = TriageAssessment {
            id: TimestampId::generate(now, None),
            encounter_id,
            hospital_id: loaded.value.hospital_id,
            created_by: by,
            ctas_level,
            priority_score,
            note,
            vital_signs,
            created_at: now,
        };

        self.encounters
            .record_assessment_and_advance(assessment.clone(), loaded.version)?;

        self.events.append(
            encounter_id,
            assessment.hospital_id,
            EventType::AssessmentRecorded,
            json!({
                "assessment_id": assessment.id.to_string(),
                "ctas_level": assessment.ctas_level,
                "priority_score": assessment.priority_score,
            }),
            now,
        )?;

        tracing::info!(
            encounter = %encounter_id,
            assessment = %assessment.id,
            ctas = %assessment.ctas_level,
            "assessment recorded"
        );
        Ok(assessment)
    }
}
