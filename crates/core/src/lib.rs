//! # EDFLOW Core
//!
//! Core business logic for the EDFLOW emergency-department encounter tracker.
//!
//! This crate contains the stateful encounter workflow and its guard rails:
//! - Guarded status transitions through a pure state machine
//! - An append-only event log with lease-based claim/process semantics
//! - Triage assessment linking with an atomic current-pointer advance
//! - A periodic alert engine that raises deduplicated time-threshold alerts
//! - A per-encounter messaging thread
//!
//! **No API concerns**: HTTP routing, authentication, or service interfaces
//! belong to the adapters around this crate. Storage is reached only through
//! the narrow repository traits in [`store`]; the bundled
//! [`store::memory::MemoryStore`] backs tests and the demonstration runtime.
//!
//! Every mutating operation takes `now` from the caller. The core never reads
//! the wall clock, which keeps transitions and alert thresholds deterministic
//! under test.

pub mod actor;
pub mod alert_engine;
pub mod alerts;
pub mod commands;
pub mod config;
pub mod constants;
pub mod encounter;
pub mod error;
pub mod events;
pub mod messaging;
pub mod state_machine;
pub mod store;
pub mod triage;

pub use actor::ActorId;
pub use alert_engine::{AlertEngine, AlertService, ScanSummary};
pub use alerts::{Alert, AlertRule, AlertSeverity, AlertType};
pub use commands::CommandService;
pub use config::CoreConfig;
pub use encounter::{Encounter, EncounterStatus};
pub use error::{CoreError, CoreResult};
pub use events::{EncounterEvent, EventLog, EventType, NewEvent};
pub use messaging::{Message, MessagingLog};
pub use state_machine::EncounterAction;
pub use store::{Versioned, memory::MemoryStore};
pub use triage::{TriageAssessment, TriageService};
