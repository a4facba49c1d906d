//! Constants used throughout the EDFLOW core crate.
//!
//! This module gathers the default thresholds and bounds so they stay
//! consistent across the codebase and the runtime's environment overrides.

/// Default interval between alert scan cycles, in seconds.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

/// Default minutes after `triaged_at` before a triage reassessment is overdue.
pub const DEFAULT_TRIAGE_REASSESSMENT_MINUTES: i64 = 30;

/// Default minutes after `waiting_at` before a disposition decision is overdue.
pub const DEFAULT_WAITING_DISPOSITION_MINUTES: i64 = 120;

/// Default number of encounters loaded per page during an alert scan.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 100;

/// Default lease on a claimed event before it returns to the unprocessed pool, in seconds.
pub const DEFAULT_EVENT_LEASE_SECS: i64 = 300;

/// Default maximum number of events handed out per claim call.
pub const DEFAULT_EVENT_CLAIM_BATCH: usize = 50;
