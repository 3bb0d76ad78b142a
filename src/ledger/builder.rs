use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::decimal::Money;
use crate::ledger::{Ledger, LedgerContext, Row};

/// lay down one row per day before any automatic recharge is considered
///
/// special recharges are attached to the row of their request date and
/// credited on the row of their credit date. projected balances are left at
/// zero; the pipeline fills them in afterwards.
pub fn build_initial_rows(ctx: &LedgerContext<'_>) -> Ledger {
    let params = ctx.params;
    let projector = ctx.projector();
    let credits = special_credits(ctx);

    let mut rows = Vec::with_capacity(params.rows as usize);
    let mut balance = params.initial_balance;
    let mut date = params.start_date;

    for i in 0..params.rows {
        if i > 0 {
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        let (consumption, overridden) = ctx.consumption_for(date, balance);
        let recharge = ctx
            .overrides
            .special_recharge_requested_on(date)
            .map(|special| special.to_record());
        let credited_amount = credits.get(&date).copied().unwrap_or(Money::ZERO);
        let closing_balance = balance - consumption + credited_amount;

        rows.push(Row {
            date,
            is_working_day: ctx.calendar.is_working_day(date),
            is_business_day: ctx.calendar.is_business_day(date),
            opening_balance: balance,
            consumption,
            consumption_overridden: overridden,
            recharge,
            credited_amount,
            closing_balance,
            projection_date: projector.settlement_date(date),
            projected_balance: Money::ZERO,
        });

        balance = closing_balance;
    }

    Ledger::new(params.start_date, rows)
}

fn special_credits(ctx: &LedgerContext<'_>) -> BTreeMap<NaiveDate, Money> {
    let mut credits: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for special in &ctx.overrides.special_recharges {
        *credits.entry(special.credited_on).or_default() += special.amount;
    }
    credits
}
