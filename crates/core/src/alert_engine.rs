//! Periodic alert scanning and alert lifecycle operations.
//!
//! The engine runs independently of command handling, on a fixed interval
//! driven by the host process. Each cycle pages through encounters in
//! non-terminal status, evaluates every rule, and inserts an alert only when
//! the threshold is exceeded and no open alert of that type exists for the
//! encounter. Correctness of the dedup rests on the store's conditional
//! insert, not on exclusion between scans, so overlapping cycles are safe.
//!
//! A single encounter failing evaluation must not abort the cycle: failures
//! are logged and counted, and the scan continues over the rest of the page.

use chrono::{DateTime, Utc};
use edflow_ids::TimestampId;
use serde_json::json;
use std::sync::Arc;

use crate::actor::ActorId;
use crate::alerts::{Alert, AlertRule};
use crate::config::CoreConfig;
use crate::encounter::Encounter;
use crate::store::{AlertStore, EncounterStore};
use crate::CoreResult;

/// Outcome of one scan cycle, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Encounters examined this cycle.
    pub scanned: usize,
    /// Alerts inserted this cycle.
    pub raised: usize,
    /// Alerts suppressed because an open alert of the type already existed.
    pub deduplicated: usize,
    /// Encounters whose evaluation failed (logged, cycle continued).
    pub failures: usize,
}

/// The periodic scanner.
pub struct AlertEngine {
    encounters: Arc<dyn EncounterStore>,
    alerts: Arc<dyn AlertStore>,
    rules: Vec<Box<dyn AlertRule>>,
    page_size: usize,
}

impl AlertEngine {
    pub fn new(
        encounters: Arc<dyn EncounterStore>,
        alerts: Arc<dyn AlertStore>,
        rules: Vec<Box<dyn AlertRule>>,
        cfg: &CoreConfig,
    ) -> Self {
        Self {
            encounters,
            alerts,
            rules,
            page_size: cfg.scan_page_size(),
        }
    }

    /// Runs one scan cycle over all active encounters.
    ///
    /// Storage failures while loading a page end the cycle early (the next
    /// tick retries from scratch); per-encounter failures are isolated.
    pub fn scan(&self, now: DateTime<Utc>) -> ScanSummary {
        let mut summary = ScanSummary::default();
        let mut offset = 0;

        loop {
            let page = match self.encounters.active_page(offset, self.page_size) {
                Ok(page) => page,
                Err(error) => {
                    tracing::error!(%error, offset, "failed to load scan page; ending cycle");
                    break;
                }
            };
            if page.is_empty() {
                break;
            }

            for encounter in &page {
                summary.scanned += 1;
                match self.evaluate(encounter, now) {
                    Ok((raised, deduplicated)) => {
                        summary.raised += raised;
                        summary.deduplicated += deduplicated;
                    }
                    Err(error) => {
                        summary.failures += 1;
                        tracing::warn!(
                            encounter = %encounter.id,
                            %error,
                            "rule evaluation failed; continuing scan"
                        );
                    }
                }
            }

            if page.len() < self.page_size {
                break;
            }
            offset += page.len();
        }

        tracing::info!(
            scanned = summary.scanned,
            raised = summary.raised,
            deduplicated = summary.deduplicated,
            failures = summary.failures,
            "alert scan cycle complete"
        );
        summary
    }

    /// Evaluates every rule against one encounter; returns (raised, deduplicated).
    fn evaluate(&self, encounter: &Encounter, now: DateTime<Utc>) -> CoreResult<(usize, usize)> {
        let mut raised = 0;
        let mut deduplicated = 0;

        for rule in &self.rules {
            if !rule.applies_to(encounter) {
                continue;
            }
            let Some(since) = rule.reference_time(encounter) else {
                continue;
            };

            let elapsed_minutes = (now - since).num_minutes();
            if elapsed_minutes <= rule.threshold_minutes() {
                continue;
            }

            let alert = Alert {
                id: TimestampId::generate(now, None),
                encounter_id: encounter.id,
                hospital_id: encounter.hospital_id,
                alert_type: rule.alert_type(),
                severity: rule.severity_for(elapsed_minutes),
                metadata: json!({
                    "threshold_minutes": rule.threshold_minutes(),
                    "elapsed_minutes": elapsed_minutes,
                }),
                created_at: now,
                acknowledged_at: None,
                acknowledged_by: None,
                resolved_at: None,
                resolved_by: None,
            };

            let severity = alert.severity;
            if self.alerts.insert_if_none_open(alert)? {
                raised += 1;
                tracing::info!(
                    encounter = %encounter.id,
                    alert = %rule.alert_type(),
                    ?severity,
                    elapsed_minutes,
                    "alert raised"
                );
            } else {
                deduplicated += 1;
            }
        }

        Ok((raised, deduplicated))
    }
}

/// Staff-driven alert lifecycle: `open -> acknowledged -> resolved`, or
/// straight to resolved. Both operations are idempotent.
#[derive(Clone)]
pub struct AlertService {
    alerts: Arc<dyn AlertStore>,
}

impl AlertService {
    pub fn new(alerts: Arc<dyn AlertStore>) -> Self {
        Self { alerts }
    }

    /// Acknowledges an alert.
    ///
    /// A second acknowledgement, or an acknowledgement of an already-resolved
    /// alert, is a no-op returning the current row.
    ///
    /// # Errors
    ///
    /// [`crate::CoreError::NotFound`] for an unknown alert;
    /// [`crate::CoreError::ConcurrentModification`] if the row changed since load
    /// (the caller reloads and may retry once).
    pub fn acknowledge(
        &self,
        alert_id: &TimestampId,
        by: ActorId,
        now: DateTime<Utc>,
    ) -> CoreResult<Alert> {
        let loaded = self.alerts.load_alert(alert_id)?;
        let mut alert = loaded.value;

        if alert.acknowledged_at.is_some() || alert.resolved_at.is_some() {
            return Ok(alert);
        }

        alert.acknowledged_at = Some(now);
        alert.acknowledged_by = Some(by);
        self.alerts.save_alert(alert.clone(), loaded.version)?;
        Ok(alert)
    }

    /// Resolves an alert, closing it. Idempotent.
    ///
    /// # Errors
    ///
    /// [`crate::CoreError::NotFound`] for an unknown alert;
    /// [`crate::CoreError::ConcurrentModification`] if the row changed since load.
    pub fn resolve(
        &self,
        alert_id: &TimestampId,
        by: ActorId,
        now: DateTime<Utc>,
    ) -> CoreResult<Alert> {
        let loaded = self.alerts.load_alert(alert_id)?;
        let mut alert = loaded.value;

        if alert.resolved_at.is_some() {
            return Ok(alert);
        }

        alert.resolved_at = Some(now);
        alert.resolved_by = Some(by);
        self.alerts.save_alert(alert.clone(), loaded.version)?;
        Ok(alert)
    }
}
