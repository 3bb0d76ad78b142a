use crate::events::{Event, EventStore};
use crate::ledger::{CreditSchedule, Ledger, LedgerContext};
use crate::types::{automatic_recharge_id, RechargeOrigin, RechargeRecord};

/// walks the ledger once, inserting recharges wherever the projected balance
/// would fall under the minimum
///
/// every inserted recharge triggers a recompute of the balances and
/// projections from its row to the end, so the cost is quadratic in the row
/// count.
pub struct RechargeScheduler<'a> {
    ctx: &'a LedgerContext<'a>,
}

impl<'a> RechargeScheduler<'a> {
    pub fn new(ctx: &'a LedgerContext<'a>) -> Self {
        Self { ctx }
    }

    /// schedule recharges in place, returning how many automatic ones were
    /// attached
    pub fn run(&self, ledger: &mut Ledger, events: &mut EventStore) -> usize {
        let params = self.ctx.params;
        let projector = self.ctx.projector();
        let mut attached = 0;

        for i in 0..ledger.rows.len() {
            // special recharges were laid down with the rows and their credits
            // are already in the balances, so adopting one only records it
            if let Some(existing) = &ledger.rows[i].recharge {
                if existing.origin == RechargeOrigin::Special {
                    events.emit(Event::SpecialRechargeAdopted {
                        id: existing.id,
                        requested_on: existing.requested_on,
                        credited_on: existing.credited_on,
                        amount: existing.amount,
                    });
                }
                continue;
            }

            // only days the bank is open can originate a request
            if !ledger.rows[i].is_business_day {
                continue;
            }

            self.refresh_row(ledger, i);
            let date = ledger.rows[i].date;

            let credits = CreditSchedule::collect(ledger, self.ctx.overrides);
            let projected = projector.projected_balance(ledger, &credits, date);
            if projected >= params.minimum_balance {
                continue;
            }

            let record = RechargeRecord {
                id: automatic_recharge_id(date),
                amount: params.recharge_amount,
                requested_on: date,
                credited_on: projector.settlement_date(date),
                origin: RechargeOrigin::Automatic,
            };
            log::debug!(
                "projected balance {} under minimum {} on {}: requesting {} for {}",
                projected,
                params.minimum_balance,
                date,
                record.amount,
                record.credited_on
            );
            events.emit(Event::RechargeScheduled {
                id: record.id,
                requested_on: record.requested_on,
                credited_on: record.credited_on,
                amount: record.amount,
                projected_balance: projected,
                minimum_balance: params.minimum_balance,
            });

            let credit_index = ledger.index_of(record.credited_on);
            let record_id = record.id;
            let credited_on = record.credited_on;
            ledger.rows[i].recharge = Some(record);
            attached += 1;

            match credit_index {
                Some(credit_index) => {
                    // the credit row gains the amount through the balance
                    // recompute, which also carries it to every later row
                    let from = i.min(credit_index);
                    self.ctx.propagate_balances(ledger, from);
                    self.ctx.reproject(ledger, from);
                }
                None => {
                    log::warn!(
                        "recharge requested on {} credits on {}, beyond the last projected day",
                        date,
                        credited_on
                    );
                    events.emit(Event::RechargeBeyondHorizon {
                        id: record_id,
                        requested_on: date,
                        credited_on,
                    });
                }
            }
        }

        attached
    }

    /// recompute a row's consumption and closing from its current opening
    fn refresh_row(&self, ledger: &mut Ledger, index: usize) {
        let row = &mut ledger.rows[index];
        let (consumption, overridden) = self.ctx.consumption_for(row.date, row.opening_balance);
        row.consumption = consumption;
        row.consumption_overridden = overridden;
        row.closing_balance = row.opening_balance - consumption + row.credited_amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParametersBuilder, PlannerParameters};
    use crate::decimal::Money;
    use crate::ledger::{build_initial_rows, finalize_projections};
    use crate::overrides::Overrides;
    use crate::types::SpecialRecharge;
    use chrono::NaiveDate;

    // 2025-06-02 is a monday
    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn params(lag: u32, rows: u32) -> PlannerParameters {
        ParametersBuilder::new()
            .start_date(date(2))
            .settlement_lag(lag)
            .no_holidays()
            .rows(rows)
            .build_from(date(2))
            .unwrap()
    }

    fn schedule(params: &PlannerParameters, overrides: &Overrides) -> (Ledger, EventStore, usize) {
        let ctx = LedgerContext::new(params, overrides);
        let mut ledger = build_initial_rows(&ctx);
        let mut events = EventStore::new();
        let attached = RechargeScheduler::new(&ctx).run(&mut ledger, &mut events);
        finalize_projections(&ctx, &mut ledger);
        (ledger, events, attached)
    }

    #[test]
    fn test_zero_lag_recharges_same_day() {
        let params = params(0, 5);
        let (ledger, _, attached) = schedule(&params, &Overrides::new());

        // wednesday ends at 50k without help
        assert_eq!(attached, 1);
        let row = ledger.row(date(4)).unwrap();
        let recharge = row.recharge.as_ref().unwrap();
        assert_eq!(recharge.requested_on, date(4));
        assert_eq!(recharge.credited_on, date(4));
        assert_eq!(row.closing_balance, Money::from_major(550_000));
    }

    #[test]
    fn test_special_recharge_is_never_replaced() {
        let params = params(3, 10);
        let mut overrides = Overrides::new();
        let special = SpecialRecharge::new(Money::from_major(10_000), date(2), date(5));
        overrides.special_recharges.push(special.clone());

        let (ledger, _, _) = schedule(&params, &overrides);

        let monday = ledger.row(date(2)).unwrap().recharge.clone().unwrap();
        assert_eq!(monday.id, special.id);
        assert_eq!(monday.amount, Money::from_major(10_000));
        assert_eq!(monday.origin, RechargeOrigin::Special);

        // the small special credit leaves tuesday short, so tuesday requests
        let tuesday = ledger.row(date(3)).unwrap().recharge.clone().unwrap();
        assert_eq!(tuesday.origin, RechargeOrigin::Automatic);
        assert_eq!(tuesday.credited_on, date(6));
    }

    #[test]
    fn test_special_recharges_are_adopted() {
        let params = params(3, 10);
        let mut overrides = Overrides::new();
        let weekday = SpecialRecharge::new(Money::from_major(500_000), date(3), date(6));
        // requested on a saturday, still adopted as laid down
        let weekend = SpecialRecharge::new(Money::from_major(20_000), date(7), date(9));
        overrides.special_recharges.push(weekday.clone());
        overrides.special_recharges.push(weekend.clone());

        let (ledger, events, attached) = schedule(&params, &overrides);

        let adopted: Vec<_> = events
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::SpecialRechargeAdopted { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(adopted, vec![weekday.id, weekend.id]);
        assert_eq!(attached, ledger.automatic_recharges().count());
        assert_eq!(
            ledger.row(date(6)).unwrap().credited_amount,
            Money::from_major(500_000)
        );
    }

    #[test]
    fn test_weekends_never_request() {
        let params = params(1, 21);
        let (ledger, _, _) = schedule(&params, &Overrides::new());

        for row in &ledger.rows {
            if row.recharge.is_some() {
                assert!(row.is_business_day, "{} requested on a closed day", row.date);
            }
        }
    }

    #[test]
    fn test_credit_beyond_horizon_is_reported() {
        // settlement always lands after the last row and the fallback
        // balance is already under the minimum
        let mut params = params(3, 3);
        params.initial_balance = Money::from_major(100_000);
        let (ledger, events, _) = schedule(&params, &Overrides::new());

        let beyond = events
            .events()
            .iter()
            .filter(|e| matches!(e, Event::RechargeBeyondHorizon { .. }))
            .count();
        assert!(beyond > 0);
        // attached but nothing injected inside the horizon
        assert!(ledger.rows.iter().all(|r| r.credited_amount == Money::ZERO));
    }

    #[test]
    fn test_consumption_recomputed_after_upstream_recharge() {
        let params = params(1, 6);
        let (ledger, _, _) = schedule(&params, &Overrides::new());

        for row in ledger.rows.iter().filter(|r| r.is_working_day) {
            let expected = params.daily_budget.min(row.opening_balance);
            assert_eq!(row.consumption, expected, "{}", row.date);
        }
    }

    #[test]
    fn test_schedule_events_match_recharges() {
        let params = params(3, 10);
        let (ledger, events, attached) = schedule(&params, &Overrides::new());

        let scheduled: Vec<_> = events
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::RechargeScheduled { id, projected_balance, minimum_balance, .. } => {
                    assert!(projected_balance < minimum_balance);
                    Some(*id)
                }
                _ => None,
            })
            .collect();
        let ids: Vec<_> = ledger.recharges().map(|r| r.id).collect();
        assert_eq!(scheduled, ids);
        assert_eq!(attached, ids.len());
    }
}
