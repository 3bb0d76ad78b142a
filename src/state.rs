use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::config::PlannerParameters;
use crate::errors::{PlannerError, Result};
use crate::overrides::Overrides;

/// current layout of the persisted snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// everything a host needs to persist to rebuild the planner
///
/// dates are stored as `YYYY-MM-DD` strings and parsed back into dates on
/// load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub parameters: PlannerParameters,
    #[serde(default)]
    pub overrides: Overrides,
}

impl PlannerSnapshot {
    pub fn capture(parameters: &PlannerParameters, overrides: &Overrides) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            parameters: parameters.clone(),
            overrides: overrides.clone(),
        }
    }

    pub fn defaults(time_provider: &SafeTimeProvider) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            parameters: PlannerParameters::defaults(time_provider),
            overrides: Overrides::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// parse and validate a stored snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: PlannerSnapshot = serde_json::from_str(json)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(PlannerError::Serialization {
                message: format!("unsupported snapshot version {}", snapshot.version),
            });
        }
        snapshot.parameters.validate()?;
        Ok(snapshot)
    }

    /// stored snapshot, or the defaults when nothing usable was stored
    pub fn restore_or_default(json: Option<&str>, time_provider: &SafeTimeProvider) -> Self {
        let Some(json) = json else {
            return Self::defaults(time_provider);
        };

        match Self::from_json(json) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("stored planner state unusable, falling back to defaults: {}", e);
                Self::defaults(time_provider)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::planner::Planner;
    use crate::types::SpecialRecharge;
    use chrono::{NaiveDate, TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
        ))
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_snapshot_restores_identical_ledger() {
        let _ = env_logger::builder().is_test(true).try_init();
        let time = time();
        let mut planner = Planner::with_defaults(&time);
        planner.set_special_consumption(date(4), Money::from_major(20_000)).unwrap();
        planner.toggle_working_day(date(7));
        planner
            .upsert_special_recharge(
                SpecialRecharge::new(Money::from_major(90_000), date(9), date(12)),
                false,
            )
            .unwrap();

        let json = planner.snapshot().to_json().unwrap();
        let restored = Planner::restore(Some(&json), &time);

        assert_eq!(restored.snapshot(), planner.snapshot());
        assert_eq!(restored.ledger(), planner.ledger());
    }

    #[test]
    fn test_dates_stored_as_iso_strings() {
        let snapshot = PlannerSnapshot::defaults(&time());
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"start_date\":\"2025-06-02\""));
        assert!(json.contains("\"2025-12-25\""));
    }

    #[test]
    fn test_corrupt_state_falls_back_to_defaults() {
        let _ = env_logger::builder().is_test(true).try_init();
        let time = time();
        let defaults = PlannerSnapshot::defaults(&time);

        assert_eq!(PlannerSnapshot::restore_or_default(None, &time), defaults);
        assert_eq!(PlannerSnapshot::restore_or_default(Some("{not json"), &time), defaults);
        assert_eq!(PlannerSnapshot::restore_or_default(Some("{}"), &time), defaults);

        let mut bad = defaults.clone();
        bad.parameters.rows = 0;
        let json = serde_json::to_string(&bad).unwrap();
        assert_eq!(PlannerSnapshot::restore_or_default(Some(&json), &time), defaults);
    }

    #[test]
    fn test_future_version_rejected() {
        let mut snapshot = PlannerSnapshot::defaults(&time());
        snapshot.version = SNAPSHOT_VERSION + 1;
        let json = snapshot.to_json().unwrap();
        assert!(matches!(
            PlannerSnapshot::from_json(&json),
            Err(PlannerError::Serialization { .. })
        ));
    }

    #[test]
    fn test_missing_overrides_default_to_empty() {
        let snapshot = PlannerSnapshot::defaults(&time());
        let params = serde_json::to_value(&snapshot.parameters).unwrap();
        let json = serde_json::json!({ "parameters": params }).to_string();

        let restored = PlannerSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
    }
}
