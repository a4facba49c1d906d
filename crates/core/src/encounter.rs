//! The encounter aggregate.
//!
//! One `Encounter` per emergency-department visit, created at intake in
//! [`EncounterStatus::Expected`] and mutated only through state-machine
//! validated transitions. Encounters are never physically deleted; abandoning
//! one goes through the `Cancelled` status.
//!
//! Status and timestamps stay consistent by construction: every transition
//! sets exactly one pipeline timestamp (see [`crate::state_machine`]), and
//! each timestamp is written at most once.

use chrono::{DateTime, Utc};
use edflow_ids::{RecordId, TimestampId};
use edflow_types::{CtasLevel, PriorityScore};
use serde::{Deserialize, Serialize};

use crate::state_machine::{self, EncounterAction};
use crate::CoreResult;

/// Workflow status of an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncounterStatus {
    /// Registered pre-arrival; the patient has not yet presented.
    Expected,
    /// Arrival confirmed; awaiting the triage exam.
    Admitted,
    /// Triage exam underway or completed, reassessment clock running.
    Triage,
    /// Triaged and waiting for disposition.
    Waiting,
    /// Discharged normally. Terminal.
    Complete,
    /// Left before completion. Terminal.
    Unresolved,
    /// Visit cancelled. Terminal.
    Cancelled,
}

impl EncounterStatus {
    /// Terminal statuses are absorbing: no further transition is legal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Unresolved | Self::Cancelled)
    }
}

impl std::fmt::Display for EncounterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Expected => "EXPECTED",
            Self::Admitted => "ADMITTED",
            Self::Triage => "TRIAGE",
            Self::Waiting => "WAITING",
            Self::Complete => "COMPLETE",
            Self::Unresolved => "UNRESOLVED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{name}")
    }
}

/// One emergency-department visit by one patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: RecordId,
    pub patient_id: RecordId,
    /// Unset until a hospital is assigned (pre-arrival registrations may not
    /// know the receiving site yet).
    pub hospital_id: Option<RecordId>,
    pub status: EncounterStatus,
    pub expected_at: DateTime<Utc>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub triaged_at: Option<DateTime<Utc>>,
    pub waiting_at: Option<DateTime<Utc>>,
    pub departed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Denormalized pointer to the most recent triage assessment, for fast
    /// read access. Advanced only through the atomic repository operation.
    pub current_assessment_id: Option<TimestampId>,
    pub current_ctas_level: Option<CtasLevel>,
    pub current_priority_score: Option<PriorityScore>,
}

impl Encounter {
    /// Creates a new encounter at intake, in status `Expected`.
    pub fn register(
        id: RecordId,
        patient_id: RecordId,
        hospital_id: Option<RecordId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            patient_id,
            hospital_id,
            status: EncounterStatus::Expected,
            expected_at: now,
            arrived_at: None,
            triaged_at: None,
            waiting_at: None,
            departed_at: None,
            cancelled_at: None,
            current_assessment_id: None,
            current_ctas_level: None,
            current_priority_score: None,
        }
    }

    /// Applies a state-machine action, setting the new status and its
    /// pipeline timestamp.
    ///
    /// On rejection the encounter is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidTransition`] if `action` is not
    /// legal from the current status.
    pub fn apply(&mut self, action: EncounterAction, now: DateTime<Utc>) -> CoreResult<()> {
        let next = state_machine::transition(self.status, action)?;

        match next {
            EncounterStatus::Admitted => self.arrived_at = Some(now),
            EncounterStatus::Triage => self.triaged_at = Some(now),
            EncounterStatus::Waiting => self.waiting_at = Some(now),
            EncounterStatus::Complete | EncounterStatus::Unresolved => {
                self.departed_at = Some(now)
            }
            EncounterStatus::Cancelled => self.cancelled_at = Some(now),
            // No action leads back to Expected; transition() upholds this.
            EncounterStatus::Expected => {}
        }

        self.status = next;
        Ok(())
    }
}
