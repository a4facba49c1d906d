//! Command surface consumed by the outer adapters.
//!
//! Each command maps 1:1 to a state-machine action: load the versioned
//! aggregate, run the pure transition, save conditionally on the loaded
//! version, then append a `STATUS_CHANGED` event. A
//! [`crate::CoreError::ConcurrentModification`] is returned to the caller,
//! who must reload and re-validate; the core never retries silently because
//! a transition valid against the old state may be illegal against the new
//! one.

use chrono::{DateTime, Utc};
use edflow_ids::RecordId;
use serde_json::json;
use std::sync::Arc;

use crate::actor::ActorId;
use crate::encounter::Encounter;
use crate::events::{EventLog, EventType};
use crate::state_machine::EncounterAction;
use crate::store::EncounterStore;
use crate::CoreResult;

/// Synchronous command handling over the encounter aggregate.
#[derive(Clone)]
pub struct CommandService {
    encounters: Arc<dyn EncounterStore>,
    events: EventLog,
}

impl CommandService {
    pub fn new(encounters: Arc<dyn EncounterStore>, events: EventLog) -> Self {
        Self { encounters, events }
    }

    /// Registers a new encounter at intake, in status `EXPECTED`.
    ///
    /// `hospital_id` may be unknown for a pre-arrival registration and
    /// assigned later by the intake adapter.
    pub fn register(
        &self,
        patient_id: RecordId,
        hospital_id: Option<RecordId>,
        now: DateTime<Utc>,
    ) -> CoreResult<Encounter> {
        let encounter = Encounter::register(RecordId::new(), patient_id, hospital_id, now);
        self.encounters.create_encounter(encounter.clone())?;

        self.events.append(
            encounter.id,
            hospital_id,
            EventType::EncounterCreated,
            json!({ "patient_id": patient_id }),
            now,
        )?;

        tracing::info!(encounter = %encounter.id, patient = %patient_id, "encounter registered");
        Ok(encounter)
    }

    /// Patient has presented: `EXPECTED -> ADMITTED`.
    pub fn confirm_arrival(
        &self,
        encounter_id: RecordId,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> CoreResult<Encounter> {
        self.transition(encounter_id, EncounterAction::ConfirmArrival, actor, None, now)
    }

    /// Triage exam begins: `ADMITTED -> TRIAGE`.
    pub fn start_exam(
        &self,
        encounter_id: RecordId,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> CoreResult<Encounter> {
        self.transition(encounter_id, EncounterAction::StartExam, actor, None, now)
    }

    /// Triage complete: `TRIAGE -> WAITING`.
    pub fn move_to_waiting(
        &self,
        encounter_id: RecordId,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> CoreResult<Encounter> {
        self.transition(encounter_id, EncounterAction::MoveToWaiting, actor, None, now)
    }

    /// Normal discharge: `WAITING -> COMPLETE`.
    pub fn discharge(
        &self,
        encounter_id: RecordId,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> CoreResult<Encounter> {
        self.transition(encounter_id, EncounterAction::Discharge, actor, None, now)
    }

    /// Patient left before completion: `ADMITTED/TRIAGE/WAITING -> UNRESOLVED`.
    pub fn mark_unresolved(
        &self,
        encounter_id: RecordId,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> CoreResult<Encounter> {
        self.transition(encounter_id, EncounterAction::LeaveUnresolved, actor, None, now)
    }

    /// Cancels a visit from any non-terminal state. The optional reason is
    /// kept in the event metadata, not on the encounter row.
    pub fn cancel(
        &self,
        encounter_id: RecordId,
        actor: &ActorId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<Encounter> {
        self.transition(encounter_id, EncounterAction::Cancel, actor, reason, now)
    }

    fn transition(
        &self,
        encounter_id: RecordId,
        action: EncounterAction,
        actor: &ActorId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<Encounter> {
        let loaded = self.encounters.load_encounter(&encounter_id)?;
        let mut encounter = loaded.value;
        let from = encounter.status;

        encounter.apply(action, now)?;
        self.encounters.save_encounter(encounter.clone(), loaded.version)?;

        let mut metadata = json!({
            "action": action,
            "from": from,
            "to": encounter.status,
            "actor": actor,
        });
        if let Some(reason) = reason {
            metadata["reason"] = json!(reason);
        }
        self.events.append(
            encounter.id,
            encounter.hospital_id,
            EventType::StatusChanged,
            metadata,
            now,
        )?;

        tracing::info!(
            encounter = %encounter.id,
            %action,
            %from,
            to = %encounter.status,
            "encounter transitioned"
        );
        Ok(encounter)
    }
}
