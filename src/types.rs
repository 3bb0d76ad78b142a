use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{PlannerError, Result};

/// unique identifier for a recharge
pub type RechargeId = Uuid;

/// namespace for automatic recharge identifiers
const AUTOMATIC_RECHARGE_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_9b3d_4c7a_8e52_d1f0_a9b8_c3e4);

/// deterministic identifier for the automatic recharge requested on `date`
///
/// a row holds at most one recharge, so the request date alone is unique
pub fn automatic_recharge_id(date: NaiveDate) -> RechargeId {
    Uuid::new_v5(&AUTOMATIC_RECHARGE_NAMESPACE, date.to_string().as_bytes())
}

/// where a recharge came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RechargeOrigin {
    /// synthesized by the scheduler to keep the balance above the floor
    Automatic,
    /// entered by the user in the override store
    Special,
}

/// recharge attached to the row of its request date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RechargeRecord {
    pub id: RechargeId,
    pub amount: Money,
    pub requested_on: NaiveDate,
    pub credited_on: NaiveDate,
    pub origin: RechargeOrigin,
}

impl RechargeRecord {
    pub fn credits_on(&self, date: NaiveDate) -> bool {
        self.credited_on == date
    }
}

/// user-entered recharge held in the override store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRecharge {
    pub id: RechargeId,
    pub amount: Money,
    pub requested_on: NaiveDate,
    pub credited_on: NaiveDate,
}

impl SpecialRecharge {
    pub fn new(amount: Money, requested_on: NaiveDate, credited_on: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            requested_on,
            credited_on,
        }
    }

    pub fn to_record(&self) -> RechargeRecord {
        RechargeRecord {
            id: self.id,
            amount: self.amount,
            requested_on: self.requested_on,
            credited_on: self.credited_on,
            origin: RechargeOrigin::Special,
        }
    }
}

/// days of the week on which the account owner spends
///
/// days are numbered from sunday = 0 to saturday = 6
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeeklySchedule {
    days: BTreeSet<u8>,
}

impl WeeklySchedule {
    /// monday to friday
    pub fn weekdays() -> Self {
        Self {
            days: (1..=5).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            days: BTreeSet::new(),
        }
    }

    pub fn from_weekdays<I: IntoIterator<Item = Weekday>>(days: I) -> Self {
        Self {
            days: days
                .into_iter()
                .map(|d| d.num_days_from_sunday() as u8)
                .collect(),
        }
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.days.contains(&(weekday.num_days_from_sunday() as u8))
    }

    pub fn includes_date(&self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl TryFrom<Vec<u8>> for WeeklySchedule {
    type Error = PlannerError;

    fn try_from(days: Vec<u8>) -> Result<Self> {
        if let Some(bad) = days.iter().find(|d| **d > 6) {
            return Err(PlannerError::InvalidConfiguration {
                message: format!("weekday number out of range: {}", bad),
            });
        }
        Ok(Self {
            days: days.into_iter().collect(),
        })
    }
}

impl From<WeeklySchedule> for Vec<u8> {
    fn from(schedule: WeeklySchedule) -> Self {
        schedule.days.into_iter().collect()
    }
}

impl FromStr for WeeklySchedule {
    type Err = PlannerError;

    /// parse a comma separated list such as "1,2,3,4,5"
    fn from_str(s: &str) -> Result<Self> {
        let mut days = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let day = part.parse::<u8>().map_err(|_| PlannerError::InvalidConfiguration {
                message: format!("invalid weekday number: {:?}", part),
            })?;
            days.push(day);
        }
        WeeklySchedule::try_from(days)
    }
}

impl fmt::Display for WeeklySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.days.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// parse a user-entered amount, rejecting input without digits
pub fn parse_amount(input: &str) -> Result<Money> {
    Money::parse_input(input).ok_or_else(|| PlannerError::InvalidAmount {
        input: input.to_string(),
    })
}

/// parse an iso `YYYY-MM-DD` date
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| PlannerError::InvalidDate {
        message: format!("{:?}: {}", input, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_parsing() {
        let schedule: WeeklySchedule = "1,2,3,4,5".parse().unwrap();
        assert_eq!(schedule, WeeklySchedule::weekdays());
        assert!(schedule.contains(Weekday::Mon));
        assert!(!schedule.contains(Weekday::Sun));
        assert_eq!(schedule.to_string(), "1,2,3,4,5");
    }

    #[test]
    fn test_schedule_rejects_out_of_range_day() {
        assert!("1,2,9".parse::<WeeklySchedule>().is_err());
        assert!("mon".parse::<WeeklySchedule>().is_err());
    }

    #[test]
    fn test_schedule_serde_as_numbers() {
        let schedule = WeeklySchedule::from_weekdays([Weekday::Sat, Weekday::Sun]);
        let json = serde_json::to_string(&schedule).unwrap();
        assert_eq!(json, "[0,6]");

        let back: WeeklySchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schedule);
        assert!(serde_json::from_str::<WeeklySchedule>("[7]").is_err());
    }

    #[test]
    fn test_automatic_ids_are_stable() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let other = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        assert_eq!(automatic_recharge_id(date), automatic_recharge_id(date));
        assert_ne!(automatic_recharge_id(date), automatic_recharge_id(other));
    }

    #[test]
    fn test_input_parsing() {
        assert_eq!(parse_amount("$ 20.000").unwrap(), Money::from_major(20_000));
        assert!(matches!(parse_amount("--"), Err(PlannerError::InvalidAmount { .. })));
        assert_eq!(
            parse_date("2025-03-04").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
        );
        assert!(matches!(parse_date("2025-13-01"), Err(PlannerError::InvalidDate { .. })));
    }
}
