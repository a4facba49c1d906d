use crate::encounter::EncounterStatus;
use crate::state_machine::EncounterAction;

/// Error taxonomy for core operations.
///
/// Command errors surface to callers as rejected actions naming the offending
/// state; they are never retried automatically by the core. Transient storage
/// failures are propagated unmodified in [`CoreError::Storage`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The action is not legal from the encounter's current status.
    #[error("cannot {action}: encounter is in {from}")]
    InvalidTransition {
        from: EncounterStatus,
        action: EncounterAction,
    },
    /// The encounter's status forbids the requested operation (e.g. recording
    /// an assessment on a terminal encounter).
    #[error("cannot record assessment: encounter is in {status}")]
    InvalidState { status: EncounterStatus },
    /// Optimistic-concurrency conflict on save. The caller must reload and
    /// re-validate before retrying; a transition that was valid against the
    /// old state may no longer be valid against the new one.
    #[error("record was modified concurrently; reload and re-validate before retrying")]
    ConcurrentModification,
    /// Malformed input rejected before any write.
    #[error("validation failed: {0}")]
    Validation(#[from] edflow_types::ValueError),
    /// A supplied identifier was not in canonical form.
    #[error("invalid identifier: {0}")]
    Id(#[from] edflow_ids::IdError),
    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    /// A startup configuration value was out of range or unparseable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Failure inside the storage collaborator, propagated unmodified.
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
