//! Actor identity for commands.
//!
//! Every staff or patient action on an encounter carries an actor id. The id
//! is opaque to the core: authentication happens in the excluded outer layer,
//! which hands the resolved identity through unchanged.

use edflow_types::{NonEmptyText, ValueError};
use serde::{Deserialize, Serialize};

/// Opaque identity of the person performing a command.
///
/// Either a staff user id or a patient id; the core never distinguishes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(NonEmptyText);

impl ActorId {
    /// Wraps an actor id, rejecting blank input.
    pub fn new(input: impl AsRef<str>) -> Result<Self, ValueError> {
        Ok(Self(NonEmptyText::new(input)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
