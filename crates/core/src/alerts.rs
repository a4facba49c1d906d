//! Alert records and the time-threshold rules that raise them.
//!
//! A rule names the encounters it watches, the timestamp it measures from,
//! a threshold in minutes, and how severity maps to elapsed time. The
//! [`crate::AlertEngine`] evaluates rules during its periodic scan; severity
//! is fixed at creation time. An open alert is never re-raised or escalated
//! automatically — escalation would require closing and re-raising, which
//! the engine deliberately does not do.

use chrono::{DateTime, Utc};
use edflow_ids::{RecordId, TimestampId};
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::config::CoreConfig;
use crate::encounter::{Encounter, EncounterStatus};

/// Severity assigned when the alert is raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

/// Which rule raised the alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    TriageReassessmentOverdue,
    WaitingDispositionOverdue,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TriageReassessmentOverdue => "TRIAGE_REASSESSMENT_OVERDUE",
            Self::WaitingDispositionOverdue => "WAITING_DISPOSITION_OVERDUE",
        };
        write!(f, "{name}")
    }
}

/// One rule-violation instance for one encounter.
///
/// Created by the alert engine, acknowledged and resolved by staff action,
/// never deleted. "Open" means `resolved_at` is unset; at most one open
/// alert of a given type exists per encounter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: TimestampId,
    pub encounter_id: RecordId,
    pub hospital_id: Option<RecordId>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    /// Rule context at creation time (threshold and elapsed minutes).
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<ActorId>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<ActorId>,
}

impl Alert {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// A time-based clinical-safety rule.
///
/// Implementations are pure over the encounter snapshot: the engine supplies
/// `now`, computes elapsed minutes from [`AlertRule::reference_time`], and
/// raises when elapsed exceeds [`AlertRule::threshold_minutes`].
pub trait AlertRule: Send + Sync {
    fn alert_type(&self) -> AlertType;

    /// Whether this rule watches the encounter in its current state.
    fn applies_to(&self, encounter: &Encounter) -> bool;

    /// The timestamp the elapsed-time clock runs from; `None` suppresses the
    /// rule (the watched timestamp is not set yet).
    fn reference_time(&self, encounter: &Encounter) -> Option<DateTime<Utc>>;

    fn threshold_minutes(&self) -> i64;

    /// Severity for the elapsed time observed at raise time.
    fn severity_for(&self, elapsed_minutes: i64) -> AlertSeverity;
}

/// Patient sat in `TRIAGE` longer than the reassessment window.
///
/// Medium at the threshold, High once twice the threshold has passed.
pub struct TriageReassessmentOverdue {
    threshold_minutes: i64,
}

impl TriageReassessmentOverdue {
    pub fn new(threshold_minutes: i64) -> Self {
        Self { threshold_minutes }
    }
}

impl AlertRule for TriageReassessmentOverdue {
    fn alert_type(&self) -> AlertType {
        AlertType::TriageReassessmentOverdue
    }

    fn applies_to(&self, encounter: &Encounter) -> bool {
        encounter.status == EncounterStatus::Triage
    }

    fn reference_time(&self, encounter: &Encounter) -> Option<DateTime<Utc>> {
        encounter.triaged_at
    }

    fn threshold_minutes(&self) -> i64 {
        self.threshold_minutes
    }

    fn severity_for(&self, elapsed_minutes: i64) -> AlertSeverity {
        if elapsed_minutes >= self.threshold_minutes * 2 {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        }
    }
}

/// Patient waited for a disposition decision longer than the target window.
///
/// Low at the threshold, Medium once twice the threshold has passed.
pub struct WaitingDispositionOverdue {
    threshold_minutes: i64,
}

impl WaitingDispositionOverdue {
    pub fn new(threshold_minutes: i64) -> Self {
        Self { threshold_minutes }
    }
}

impl AlertRule for WaitingDispositionOverdue {
    fn alert_type(&self) -> AlertType {
        AlertType::WaitingDispositionOverdue
    }

    fn applies_to(&self, encounter: &Encounter) -> bool {
        encounter.status == EncounterStatus::Waiting
    }

    fn reference_time(&self, encounter: &Encounter) -> Option<DateTime<Utc>> {
        encounter.waiting_at
    }

    fn threshold_minutes(&self) -> i64 {
        self.threshold_minutes
    }

    fn severity_for(&self, elapsed_minutes: i64) -> AlertSeverity {
        if elapsed_minutes >= self.threshold_minutes * 2 {
            AlertSeverity::Medium
        } else {
            AlertSeverity::Low
        }
    }
}

/// The rule set a deployment runs by default, thresholds from configuration.
pub fn standard_rules(cfg: &CoreConfig) -> Vec<Box<dyn AlertRule>> {
    vec![
        Box::new(TriageReassessmentOverdue::new(
            cfg.triage_reassessment_minutes(),
        )),
        Box::new(WaitingDispositionOverdue::new(
            cfg.waiting_disposition_minutes(),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use edflow_ids::RecordId;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
    }

    fn triaged_encounter() -> Encounter {
        let mut e = Encounter::register(RecordId::new(), RecordId::new(), None, t(0));
        e.apply(crate::EncounterAction::ConfirmArrival, t(5)).unwrap();
        e.apply(crate::EncounterAction::StartExam, t(10)).unwrap();
        e
    }

    #[test]
    fn triage_rule_watches_only_triage_status() {
        let rule = TriageReassessmentOverdue::new(30);
        let mut encounter = triaged_encounter();
        assert!(rule.applies_to(&encounter));

        encounter.apply(crate::EncounterAction::MoveToWaiting, t(20)).unwrap();
        assert!(!rule.applies_to(&encounter));
    }

    #[test]
    fn triage_rule_measures_from_triaged_at() {
        let rule = TriageReassessmentOverdue::new(30);
        let encounter = triaged_encounter();
        assert_eq!(rule.reference_time(&encounter), Some(t(10)));
    }

    #[test]
    fn triage_severity_escalates_at_twice_threshold() {
        let rule = TriageReassessmentOverdue::new(30);
        assert_eq!(rule.severity_for(31), AlertSeverity::Medium);
        assert_eq!(rule.severity_for(59), AlertSeverity::Medium);
        assert_eq!(rule.severity_for(60), AlertSeverity::High);
        assert_eq!(rule.severity_for(240), AlertSeverity::High);
    }

    #[test]
    fn waiting_severity_runs_low_to_medium() {
        let rule = WaitingDispositionOverdue::new(120);
        assert_eq!(rule.severity_for(121), AlertSeverity::Low);
        assert_eq!(rule.severity_for(240), AlertSeverity::Medium);
    }

    #[test]
    fn standard_rules_carry_configured_thresholds() {
        let cfg = CoreConfig::default();
        let rules = standard_rules(&cfg);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].alert_type(), AlertType::TriageReassessmentOverdue);
        assert_eq!(rules[0].threshold_minutes(), 30);
        assert_eq!(rules[1].alert_type(), AlertType::WaitingDispositionOverdue);
        assert_eq!(rules[1].threshold_minutes(), 120);
    }
}
