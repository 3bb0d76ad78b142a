use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::decimal::Money;
use crate::errors::{PlannerError, Result};
use crate::types::WeeklySchedule;

/// longest settlement lag accepted, in business days
pub const MAX_SETTLEMENT_LAG: u32 = 60;

/// longest projection horizon accepted, in days
pub const MAX_ROWS: u32 = 3_660;

/// largest amount accepted anywhere, in major units
///
/// keeps every running sum over the horizon far inside `Decimal` range.
pub const MAX_AMOUNT_MAJOR: i64 = 1_000_000_000_000_000;

/// the largest accepted amount
pub fn max_amount() -> Money {
    Money::from_major(MAX_AMOUNT_MAJOR)
}

/// reject negative or oversized amounts
pub fn check_amount(amount: Money) -> Result<()> {
    if amount.is_negative() {
        return Err(PlannerError::NegativeAmount { amount });
    }
    if amount > max_amount() {
        return Err(PlannerError::AmountTooLarge {
            amount,
            max: max_amount(),
        });
    }
    Ok(())
}

/// parameters of one recomputation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerParameters {
    pub start_date: NaiveDate,
    pub daily_budget: Money,
    pub initial_balance: Money,
    pub recharge_amount: Money,
    /// business days between a recharge request and its credit
    pub settlement_lag: u32,
    pub minimum_balance: Money,
    pub rows: u32,
    pub holidays: BTreeSet<NaiveDate>,
    pub schedule: WeeklySchedule,
    pub automatic_recharges: bool,
}

impl PlannerParameters {
    /// default planning setup starting today
    pub fn defaults(time_provider: &SafeTimeProvider) -> Self {
        Self::defaults_from(time_provider.now().date_naive())
    }

    /// default planning setup starting on `start_date`
    pub fn defaults_from(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            daily_budget: Money::from_major(150_000),
            initial_balance: Money::from_major(500_000),
            recharge_amount: Money::from_major(500_000),
            settlement_lag: 3,
            minimum_balance: Money::from_major(150_000),
            rows: 60,
            holidays: default_holidays(),
            schedule: WeeklySchedule::weekdays(),
            automatic_recharges: true,
        }
    }

    /// check every value before it is allowed into a recomputation
    pub fn validate(&self) -> Result<()> {
        for (name, amount) in [
            ("daily budget", self.daily_budget),
            ("initial balance", self.initial_balance),
            ("recharge amount", self.recharge_amount),
            ("minimum balance", self.minimum_balance),
        ] {
            if amount.is_negative() {
                return Err(PlannerError::InvalidConfiguration {
                    message: format!("{} must not be negative, got {}", name, amount),
                });
            }
            if amount > max_amount() {
                return Err(PlannerError::InvalidConfiguration {
                    message: format!("{} must be at most {}, got {}", name, max_amount(), amount),
                });
            }
        }

        if self.rows == 0 || self.rows > MAX_ROWS {
            return Err(PlannerError::InvalidConfiguration {
                message: format!("row count must be between 1 and {}, got {}", MAX_ROWS, self.rows),
            });
        }

        if self.settlement_lag > MAX_SETTLEMENT_LAG {
            return Err(PlannerError::InvalidConfiguration {
                message: format!(
                    "settlement lag must be at most {} business days, got {}",
                    MAX_SETTLEMENT_LAG, self.settlement_lag
                ),
            });
        }

        if self.end_date().is_none() {
            return Err(PlannerError::InvalidDate {
                message: format!("horizon starting {} overflows the calendar", self.start_date),
            });
        }

        Ok(())
    }

    /// date of the last projected row
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.start_date
            .checked_add_days(chrono::Days::new(u64::from(self.rows.saturating_sub(1))))
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

/// bank holidays shipped with the planner (2025 calendar)
pub fn default_holidays() -> BTreeSet<NaiveDate> {
    [
        (1, 1),
        (3, 3),
        (3, 4),
        (3, 24),
        (4, 2),
        (4, 18),
        (5, 1),
        (5, 2),
        (5, 25),
        (6, 16),
        (6, 20),
        (7, 9),
        (8, 15),
        (8, 17),
        (10, 12),
        (11, 21),
        (11, 24),
        (12, 8),
        (12, 25),
    ]
    .into_iter()
    .filter_map(|(month, day)| NaiveDate::from_ymd_opt(2025, month, day))
    .collect()
}

/// builder for planner parameters
#[derive(Debug, Clone, Default)]
pub struct ParametersBuilder {
    start_date: Option<NaiveDate>,
    daily_budget: Option<Money>,
    initial_balance: Option<Money>,
    recharge_amount: Option<Money>,
    settlement_lag: Option<u32>,
    minimum_balance: Option<Money>,
    rows: Option<u32>,
    holidays: Option<BTreeSet<NaiveDate>>,
    schedule: Option<WeeklySchedule>,
    automatic_recharges: Option<bool>,
}

impl ParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn daily_budget(mut self, amount: Money) -> Self {
        self.daily_budget = Some(amount);
        self
    }

    pub fn initial_balance(mut self, amount: Money) -> Self {
        self.initial_balance = Some(amount);
        self
    }

    pub fn recharge_amount(mut self, amount: Money) -> Self {
        self.recharge_amount = Some(amount);
        self
    }

    pub fn settlement_lag(mut self, business_days: u32) -> Self {
        self.settlement_lag = Some(business_days);
        self
    }

    pub fn minimum_balance(mut self, amount: Money) -> Self {
        self.minimum_balance = Some(amount);
        self
    }

    pub fn rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    /// replace the default holiday calendar
    pub fn holidays<I: IntoIterator<Item = NaiveDate>>(mut self, holidays: I) -> Self {
        self.holidays = Some(holidays.into_iter().collect());
        self
    }

    pub fn no_holidays(mut self) -> Self {
        self.holidays = Some(BTreeSet::new());
        self
    }

    pub fn schedule(mut self, schedule: WeeklySchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn automatic_recharges(mut self, enabled: bool) -> Self {
        self.automatic_recharges = Some(enabled);
        self
    }

    /// Build with today's date when no start date was set
    pub fn build(self, time_provider: &SafeTimeProvider) -> Result<PlannerParameters> {
        let start_date = self
            .start_date
            .unwrap_or_else(|| time_provider.now().date_naive());
        self.build_from(start_date)
    }

    /// Build with an explicit fallback start date
    pub fn build_from(self, fallback_start: NaiveDate) -> Result<PlannerParameters> {
        let defaults = PlannerParameters::defaults_from(self.start_date.unwrap_or(fallback_start));

        let params = PlannerParameters {
            start_date: defaults.start_date,
            daily_budget: self.daily_budget.unwrap_or(defaults.daily_budget),
            initial_balance: self.initial_balance.unwrap_or(defaults.initial_balance),
            recharge_amount: self.recharge_amount.unwrap_or(defaults.recharge_amount),
            settlement_lag: self.settlement_lag.unwrap_or(defaults.settlement_lag),
            minimum_balance: self.minimum_balance.unwrap_or(defaults.minimum_balance),
            rows: self.rows.unwrap_or(defaults.rows),
            holidays: self.holidays.unwrap_or(defaults.holidays),
            schedule: self.schedule.unwrap_or(defaults.schedule),
            automatic_recharges: self.automatic_recharges.unwrap_or(defaults.automatic_recharges),
        };

        params.validate()?;
        Ok(params)
    }
}
