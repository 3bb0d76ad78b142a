//! Day-by-day balance ledger and the recomputation pipeline.
//!
//! A pass always rebuilds the whole sequence from the parameters and
//! overrides: [`builder`] lays down the rows, [`scheduler`] inserts automatic
//! recharges when enabled, and [`finalize_projections`] aligns every row's
//! projection with the finished balances.

pub mod builder;
pub mod scheduler;
pub mod settlement;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::calendar::CalendarRules;
use crate::config::PlannerParameters;
use crate::decimal::Money;
use crate::events::{Event, EventStore};
use crate::overrides::Overrides;
use crate::types::{RechargeOrigin, RechargeRecord};

pub use builder::build_initial_rows;
pub use scheduler::RechargeScheduler;
pub use settlement::SettlementProjector;

/// one simulated day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub date: NaiveDate,
    pub is_working_day: bool,
    pub is_business_day: bool,
    pub opening_balance: Money,
    pub consumption: Money,
    pub consumption_overridden: bool,
    /// recharge requested on this date
    pub recharge: Option<RechargeRecord>,
    /// sum of recharges credited on this date
    pub credited_amount: Money,
    pub closing_balance: Money,
    /// date a recharge requested today would be credited
    pub projection_date: NaiveDate,
    pub projected_balance: Money,
}

/// ordered, contiguous sequence of rows starting at `start_date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub start_date: NaiveDate,
    pub rows: Vec<Row>,
}

impl Ledger {
    pub fn new(start_date: NaiveDate, rows: Vec<Row>) -> Self {
        Self { start_date, rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// position of `date` in the sequence, if inside the horizon
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start_date).num_days();
        if offset < 0 {
            return None;
        }
        let index = usize::try_from(offset).ok()?;
        (index < self.rows.len()).then_some(index)
    }

    pub fn row(&self, date: NaiveDate) -> Option<&Row> {
        self.index_of(date).map(|i| &self.rows[i])
    }

    /// recharges in request order
    pub fn recharges(&self) -> impl Iterator<Item = &RechargeRecord> {
        self.rows.iter().filter_map(|r| r.recharge.as_ref())
    }

    pub fn automatic_recharges(&self) -> impl Iterator<Item = &RechargeRecord> {
        self.recharges().filter(|r| r.origin == RechargeOrigin::Automatic)
    }

    pub fn last(&self) -> Option<&Row> {
        self.rows.last()
    }
}

/// amounts credited per date, from attached recharges plus special recharges
/// that are not attached to any row (request date outside the horizon)
#[derive(Debug, Clone, Default)]
pub struct CreditSchedule {
    by_date: BTreeMap<NaiveDate, Money>,
}

impl CreditSchedule {
    pub fn collect(ledger: &Ledger, overrides: &Overrides) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Money> = BTreeMap::new();
        let mut attached = HashSet::new();

        for recharge in ledger.recharges() {
            attached.insert(recharge.id);
            *by_date.entry(recharge.credited_on).or_default() += recharge.amount;
        }

        for special in &overrides.special_recharges {
            if !attached.contains(&special.id) {
                *by_date.entry(special.credited_on).or_default() += special.amount;
            }
        }

        Self { by_date }
    }

    pub fn on(&self, date: NaiveDate) -> Money {
        self.by_date.get(&date).copied().unwrap_or(Money::ZERO)
    }
}

/// everything a pass reads, borrowed from one parameter snapshot
#[derive(Debug, Clone, Copy)]
pub struct LedgerContext<'a> {
    pub params: &'a PlannerParameters,
    pub overrides: &'a Overrides,
    pub calendar: CalendarRules<'a>,
}

impl<'a> LedgerContext<'a> {
    pub fn new(params: &'a PlannerParameters, overrides: &'a Overrides) -> Self {
        Self {
            params,
            overrides,
            calendar: CalendarRules::new(params, overrides),
        }
    }

    pub fn projector(&self) -> SettlementProjector<'a> {
        SettlementProjector::new(self.calendar, self.params.settlement_lag, self.params.initial_balance)
    }

    /// consumption for a day given its opening balance, and whether it was
    /// manually overridden
    ///
    /// a special consumption always wins; otherwise working days spend the
    /// budget capped by what is left, and other days spend nothing.
    pub fn consumption_for(&self, date: NaiveDate, opening: Money) -> (Money, bool) {
        if let Some(amount) = self.overrides.special_consumption(date) {
            return (amount, true);
        }
        if self.calendar.is_working_day(date) {
            (self.params.daily_budget.min(opening.max(Money::ZERO)), false)
        } else {
            (Money::ZERO, false)
        }
    }

    /// recompute opening, consumption and closing from `from` to the end
    pub fn propagate_balances(&self, ledger: &mut Ledger, from: usize) {
        let credits = CreditSchedule::collect(ledger, self.overrides);

        for j in from..ledger.rows.len() {
            let opening = if j == 0 {
                self.params.initial_balance
            } else {
                ledger.rows[j - 1].closing_balance
            };
            let row = &mut ledger.rows[j];
            let (consumption, overridden) = self.consumption_for(row.date, opening);
            row.opening_balance = opening;
            row.consumption = consumption;
            row.consumption_overridden = overridden;
            row.credited_amount = credits.on(row.date);
            row.closing_balance = opening - consumption + row.credited_amount;
        }
    }

    /// recompute projection date and projected balance from `from` to the end
    pub fn reproject(&self, ledger: &mut Ledger, from: usize) {
        let credits = CreditSchedule::collect(ledger, self.overrides);
        let projector = self.projector();

        let projections: Vec<(NaiveDate, Money)> = ledger.rows[from..]
            .iter()
            .map(|row| {
                (
                    projector.settlement_date(row.date),
                    projector.projected_balance(ledger, &credits, row.date),
                )
            })
            .collect();

        for (row, (date, balance)) in ledger.rows[from..].iter_mut().zip(projections) {
            row.projection_date = date;
            row.projected_balance = balance;
        }
    }
}

/// align every row's projection with the current balances
pub fn finalize_projections(ctx: &LedgerContext<'_>, ledger: &mut Ledger) {
    ctx.reproject(ledger, 0);
}

/// full recomputation: build, schedule automatic recharges, finalize
pub fn recompute(
    params: &PlannerParameters,
    overrides: &Overrides,
    events: &mut EventStore,
) -> Ledger {
    let ctx = LedgerContext::new(params, overrides);

    let mut ledger = build_initial_rows(&ctx);
    finalize_projections(&ctx, &mut ledger);

    if params.automatic_recharges {
        RechargeScheduler::new(&ctx).run(&mut ledger, events);
    }

    finalize_projections(&ctx, &mut ledger);

    let automatic = ledger.automatic_recharges().count();
    let total = ledger.recharges().count();
    log::info!(
        "recomputed {} rows from {}: {} recharges ({} automatic)",
        ledger.len(),
        params.start_date,
        total,
        automatic
    );
    events.emit(Event::LedgerRecomputed {
        start_date: params.start_date,
        rows: ledger.len(),
        recharges: total,
        automatic_recharges: automatic,
    });

    ledger
}
