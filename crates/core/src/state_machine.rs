//! Pure decision logic for encounter transitions.
//!
//! [`transition`] is a total function over (status, action) with no side
//! effects and no I/O; callers apply the result to the aggregate and persist
//! it themselves. Keeping the decision pure means the full transition matrix
//! is testable without a store, and a rejected action can never leave a
//! half-applied encounter behind.

use serde::{Deserialize, Serialize};

use crate::encounter::EncounterStatus;
use crate::{CoreError, CoreResult};

/// A command-initiated action on an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncounterAction {
    /// Patient has presented at the department.
    ConfirmArrival,
    /// Triage exam begins.
    StartExam,
    /// Triage done; patient moves to the waiting area.
    MoveToWaiting,
    /// Normal discharge.
    Discharge,
    /// Patient left before completion.
    LeaveUnresolved,
    /// Visit cancelled (no-show, duplicate registration, transfer elsewhere).
    Cancel,
}

impl std::fmt::Display for EncounterAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ConfirmArrival => "confirm-arrival",
            Self::StartExam => "start-exam",
            Self::MoveToWaiting => "move-to-waiting",
            Self::Discharge => "discharge",
            Self::LeaveUnresolved => "leave-unresolved",
            Self::Cancel => "cancel",
        };
        write!(f, "{name}")
    }
}

/// Decides the next status for `action` from `current`.
///
/// The legal transitions:
///
/// | action | valid from | result |
/// |---|---|---|
/// | confirm-arrival | EXPECTED | ADMITTED |
/// | start-exam | ADMITTED | TRIAGE |
/// | move-to-waiting | TRIAGE | WAITING |
/// | discharge | WAITING | COMPLETE |
/// | leave-unresolved | ADMITTED, TRIAGE, WAITING | UNRESOLVED |
/// | cancel | EXPECTED, ADMITTED, TRIAGE, WAITING | CANCELLED |
///
/// `COMPLETE`, `UNRESOLVED`, and `CANCELLED` are absorbing.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTransition`] for every (status, action) pair
/// not in the table above.
pub fn transition(
    current: EncounterStatus,
    action: EncounterAction,
) -> CoreResult<EncounterStatus> {
    use EncounterAction::*;
    use EncounterStatus::*;

    let next = match (current, action) {
        (Expected, ConfirmArrival) => Admitted,
        (Admitted, StartExam) => Triage,
        (Triage, MoveToWaiting) => Waiting,
        (Waiting, Discharge) => Complete,
        (Admitted | Triage | Waiting, LeaveUnresolved) => Unresolved,
        (Expected | Admitted | Triage | Waiting, Cancel) => Cancelled,
        (from, action) => return Err(CoreError::InvalidTransition { from, action }),
    };

    Ok(next)
}
