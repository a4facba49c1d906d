//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services. The intent is to avoid reading process-wide environment
//! variables during command handling or scan cycles, which can lead to
//! inconsistent behaviour in multi-threaded runtimes and test harnesses. The
//! binary reads the environment and feeds raw values through the
//! `*_from_env_value` helpers below.

use crate::constants::{
    DEFAULT_EVENT_CLAIM_BATCH, DEFAULT_EVENT_LEASE_SECS, DEFAULT_SCAN_INTERVAL_SECS,
    DEFAULT_SCAN_PAGE_SIZE, DEFAULT_TRIAGE_REASSESSMENT_MINUTES,
    DEFAULT_WAITING_DISPOSITION_MINUTES,
};
use crate::{CoreError, CoreResult};
use chrono::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    scan_interval_secs: u64,
    triage_reassessment_minutes: i64,
    waiting_disposition_minutes: i64,
    scan_page_size: usize,
    event_lease_secs: i64,
    event_claim_batch: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        scan_interval_secs: u64,
        triage_reassessment_minutes: i64,
        waiting_disposition_minutes: i64,
        scan_page_size: usize,
        event_lease_secs: i64,
        event_claim_batch: usize,
    ) -> CoreResult<Self> {
        if scan_interval_secs == 0 {
            return Err(CoreError::InvalidConfig("scan interval cannot be zero".into()));
        }
        if triage_reassessment_minutes <= 0 || waiting_disposition_minutes <= 0 {
            return Err(CoreError::InvalidConfig(
                "alert thresholds must be positive minutes".into(),
            ));
        }
        if scan_page_size == 0 || event_claim_batch == 0 {
            return Err(CoreError::InvalidConfig(
                "page size and claim batch cannot be zero".into(),
            ));
        }
        if event_lease_secs <= 0 {
            return Err(CoreError::InvalidConfig("event lease must be positive".into()));
        }

        Ok(Self {
            scan_interval_secs,
            triage_reassessment_minutes,
            waiting_disposition_minutes,
            scan_page_size,
            event_lease_secs,
            event_claim_batch,
        })
    }

    pub fn scan_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scan_interval_secs)
    }

    pub fn triage_reassessment_minutes(&self) -> i64 {
        self.triage_reassessment_minutes
    }

    pub fn waiting_disposition_minutes(&self) -> i64 {
        self.waiting_disposition_minutes
    }

    pub fn scan_page_size(&self) -> usize {
        self.scan_page_size
    }

    pub fn event_lease(&self) -> Duration {
        Duration::seconds(self.event_lease_secs)
    }

    pub fn event_claim_batch(&self) -> usize {
        self.event_claim_batch
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            triage_reassessment_minutes: DEFAULT_TRIAGE_REASSESSMENT_MINUTES,
            waiting_disposition_minutes: DEFAULT_WAITING_DISPOSITION_MINUTES,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
            event_lease_secs: DEFAULT_EVENT_LEASE_SECS,
            event_claim_batch: DEFAULT_EVENT_CLAIM_BATCH,
        }
    }
}

/// Parse a positive integer from an optional env value, falling back to `default`.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
fn positive_from_env_value(value: Option<String>, default: i64, what: &str) -> CoreResult<i64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(raw) = value else {
        return Ok(default);
    };

    let parsed: i64 = raw
        .parse()
        .map_err(|_| CoreError::InvalidConfig(format!("{} must be an integer, got '{}'", what, raw)))?;
    if parsed <= 0 {
        return Err(CoreError::InvalidConfig(format!(
            "{} must be positive, got {}",
            what, parsed
        )));
    }
    Ok(parsed)
}

/// Parse the scan interval (seconds) from an optional env value.
pub fn scan_interval_from_env_value(value: Option<String>) -> CoreResult<u64> {
    positive_from_env_value(value, DEFAULT_SCAN_INTERVAL_SECS as i64, "scan interval")
        .map(|v| v as u64)
}

/// Parse the triage reassessment threshold (minutes) from an optional env value.
pub fn triage_threshold_from_env_value(value: Option<String>) -> CoreResult<i64> {
    positive_from_env_value(
        value,
        DEFAULT_TRIAGE_REASSESSMENT_MINUTES,
        "triage reassessment threshold",
    )
}

/// Parse the waiting disposition threshold (minutes) from an optional env value.
pub fn waiting_threshold_from_env_value(value: Option<String>) -> CoreResult<i64> {
    positive_from_env_value(
        value,
        DEFAULT_WAITING_DISPOSITION_MINUTES,
        "waiting disposition threshold",
    )
}

/// Parse the scan page size from an optional env value.
pub fn page_size_from_env_value(value: Option<String>) -> CoreResult<usize> {
    positive_from_env_value(value, DEFAULT_SCAN_PAGE_SIZE as i64, "scan page size")
        .map(|v| v as usize)
}

/// Parse the event claim lease (seconds) from an optional env value.
pub fn event_lease_from_env_value(value: Option<String>) -> CoreResult<i64> {
    positive_from_env_value(value, DEFAULT_EVENT_LEASE_SECS, "event lease")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.scan_interval(), std::time::Duration::from_secs(60));
        assert_eq!(cfg.triage_reassessment_minutes(), 30);
        assert_eq!(cfg.waiting_disposition_minutes(), 120);
        assert_eq!(cfg.scan_page_size(), 100);
        assert_eq!(cfg.event_lease(), Duration::seconds(300));
    }

    #[test]
    fn new_rejects_zero_and_negative_values() {
        assert!(CoreConfig::new(0, 30, 120, 100, 300, 50).is_err());
        assert!(CoreConfig::new(60, 0, 120, 100, 300, 50).is_err());
        assert!(CoreConfig::new(60, 30, -1, 100, 300, 50).is_err());
        assert!(CoreConfig::new(60, 30, 120, 0, 300, 50).is_err());
        assert!(CoreConfig::new(60, 30, 120, 100, 0, 50).is_err());
        assert!(CoreConfig::new(60, 30, 120, 100, 300, 0).is_err());
    }

    #[test]
    fn env_value_helpers_fall_back_to_defaults() {
        assert_eq!(scan_interval_from_env_value(None).unwrap(), 60);
        assert_eq!(scan_interval_from_env_value(Some("  ".into())).unwrap(), 60);
        assert_eq!(triage_threshold_from_env_value(None).unwrap(), 30);
        assert_eq!(waiting_threshold_from_env_value(None).unwrap(), 120);
        assert_eq!(page_size_from_env_value(None).unwrap(), 100);
        assert_eq!(event_lease_from_env_value(None).unwrap(), 300);
    }

    #[test]
    fn env_value_helpers_parse_overrides() {
        assert_eq!(
            scan_interval_from_env_value(Some("15".into())).unwrap(),
            15
        );
        assert_eq!(
            triage_threshold_from_env_value(Some("45".into())).unwrap(),
            45
        );
    }

    #[test]
    fn env_value_helpers_reject_garbage() {
        assert!(scan_interval_from_env_value(Some("soon".into())).is_err());
        assert!(triage_threshold_from_env_value(Some("-5".into())).is_err());
    }
}
