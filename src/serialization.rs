/// serialization support for exporting a ledger
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::PlannerParameters;
use crate::decimal::Money;
use crate::ledger::{Ledger, Row};
use crate::types::RechargeOrigin;

/// serializable view of a computed ledger
#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerView {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub settlement_lag: u32,
    pub minimum_balance: Money,
    pub summary: LedgerSummary,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RowView {
    pub weekday: String,
    #[serde(flatten)]
    pub row: Row,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_consumption: Money,
    pub total_credited: Money,
    pub recharge_count: usize,
    pub automatic_recharge_count: usize,
    pub final_balance: Money,
    pub lowest_closing_balance: Option<Money>,
    pub lowest_closing_date: Option<NaiveDate>,
    /// first day closing under the minimum balance
    pub first_day_below_minimum: Option<NaiveDate>,
}

impl LedgerSummary {
    pub fn from_ledger(params: &PlannerParameters, ledger: &Ledger) -> Self {
        let lowest = ledger
            .rows
            .iter()
            .min_by_key(|r| r.closing_balance);

        LedgerSummary {
            total_consumption: ledger.rows.iter().map(|r| r.consumption).sum(),
            total_credited: ledger.rows.iter().map(|r| r.credited_amount).sum(),
            recharge_count: ledger.recharges().count(),
            automatic_recharge_count: ledger
                .recharges()
                .filter(|r| r.origin == RechargeOrigin::Automatic)
                .count(),
            final_balance: ledger.last().map(|r| r.closing_balance).unwrap_or(params.initial_balance),
            lowest_closing_balance: lowest.map(|r| r.closing_balance),
            lowest_closing_date: lowest.map(|r| r.date),
            first_day_below_minimum: ledger
                .rows
                .iter()
                .find(|r| r.closing_balance < params.minimum_balance)
                .map(|r| r.date),
        }
    }
}

impl LedgerView {
    pub fn new(params: &PlannerParameters, ledger: &Ledger) -> Self {
        LedgerView {
            start_date: ledger.start_date,
            end_date: ledger.last().map(|r| r.date),
            settlement_lag: params.settlement_lag,
            minimum_balance: params.minimum_balance,
            summary: LedgerSummary::from_ledger(params, ledger),
            rows: ledger
                .rows
                .iter()
                .map(|row| RowView {
                    weekday: weekday_label(row.date).to_string(),
                    row: row.clone(),
                })
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// lowercase english weekday name
pub fn weekday_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
