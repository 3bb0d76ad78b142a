use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::calendar::{is_weekend, CalendarRules};
use crate::config::{check_amount, PlannerParameters};
use crate::decimal::Money;
use crate::errors::{PlannerError, Result};
use crate::events::{DayOverrideKind, Event, EventStore};
use crate::ledger::{self, Ledger, LedgerContext, Row};
use crate::overrides::Overrides;
use crate::serialization::LedgerView;
use crate::state::PlannerSnapshot;
use crate::types::{RechargeId, RechargeOrigin, SpecialRecharge, WeeklySchedule};

/// owns one parameter snapshot and the ledger computed from it
///
/// every mutation is validated against a working copy first. a rejected
/// mutation leaves parameters, overrides and ledger untouched; an accepted one
/// triggers a full recomputation before returning.
#[derive(Debug)]
pub struct Planner {
    params: PlannerParameters,
    overrides: Overrides,
    ledger: Ledger,
    events: EventStore,
}

impl Planner {
    /// create a planner, rejecting invalid parameters or override tables
    pub fn new(params: PlannerParameters, overrides: Overrides) -> Result<Self> {
        params.validate()?;
        validate_overrides(&overrides)?;

        let mut events = EventStore::new();
        let ledger = ledger::recompute(&params, &overrides, &mut events);

        Ok(Self {
            params,
            overrides,
            ledger,
            events,
        })
    }

    /// default planning setup starting today, without overrides
    pub fn with_defaults(time_provider: &SafeTimeProvider) -> Self {
        let params = PlannerParameters::defaults(time_provider);
        let overrides = Overrides::new();
        let mut events = EventStore::new();
        let ledger = ledger::recompute(&params, &overrides, &mut events);

        Self {
            params,
            overrides,
            ledger,
            events,
        }
    }

    pub fn from_snapshot(snapshot: PlannerSnapshot) -> Result<Self> {
        Self::new(snapshot.parameters, snapshot.overrides)
    }

    /// restore persisted state, falling back to defaults when it is missing
    /// or unusable
    pub fn restore(json: Option<&str>, time_provider: &SafeTimeProvider) -> Self {
        let snapshot = PlannerSnapshot::restore_or_default(json, time_provider);
        match Self::from_snapshot(snapshot) {
            Ok(planner) => planner,
            Err(e) => {
                log::warn!("restored state rejected, using defaults: {}", e);
                Self::with_defaults(time_provider)
            }
        }
    }

    pub fn snapshot(&self) -> PlannerSnapshot {
        PlannerSnapshot::capture(&self.params, &self.overrides)
    }

    pub fn parameters(&self) -> &PlannerParameters {
        &self.params
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn rows(&self) -> &[Row] {
        self.ledger.rows()
    }

    /// mutation events since the last drain, plus the events of the latest
    /// recomputation only
    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// drain the event log; hosts keeping a session open should call this
    /// after handling each mutation
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// export the current ledger
    pub fn view(&self) -> LedgerView {
        LedgerView::new(&self.params, &self.ledger)
    }

    /// short alias for json output
    pub fn json(&self) -> String {
        self.view()
            .to_json_pretty()
            .unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        CalendarRules::new(&self.params, &self.overrides).is_business_day(date)
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        CalendarRules::new(&self.params, &self.overrides).is_working_day(date)
    }

    // consumption overrides

    pub fn set_special_consumption(&mut self, date: NaiveDate, amount: Money) -> Result<()> {
        check_amount(amount)?;

        self.overrides.special_consumptions.insert(date, amount);
        self.events.emit(Event::SpecialConsumptionSet { date, amount });
        self.recompute();
        Ok(())
    }

    /// drop a consumption override, returning whether one existed
    pub fn clear_special_consumption(&mut self, date: NaiveDate) -> bool {
        if self.overrides.special_consumptions.remove(&date).is_none() {
            return false;
        }

        self.events.emit(Event::SpecialConsumptionCleared { date });
        self.recompute();
        true
    }

    // recharge overrides

    /// blank special recharge for `requested_on`, crediting on its projected
    /// settlement date
    pub fn draft_special_recharge(&self, requested_on: NaiveDate) -> SpecialRecharge {
        let ctx = LedgerContext::new(&self.params, &self.overrides);
        let credited_on = ctx.projector().settlement_date(requested_on);
        SpecialRecharge::new(self.params.recharge_amount, requested_on, credited_on)
    }

    /// editable copy of the recharge requested on `date`, automatic or not
    ///
    /// a special recharge keeps its id. an automatic one gets a fresh id,
    /// since its own id is derived from the request date and would be
    /// handed out again to the next automatic recharge on that date.
    pub fn recharge_for_edit(&self, date: NaiveDate) -> Option<SpecialRecharge> {
        let record = self.ledger.row(date)?.recharge.as_ref()?;
        let id = match record.origin {
            RechargeOrigin::Special => record.id,
            RechargeOrigin::Automatic => Uuid::new_v4(),
        };
        Some(SpecialRecharge {
            id,
            amount: record.amount,
            requested_on: record.requested_on,
            credited_on: record.credited_on,
        })
    }

    /// add a special recharge or update the one with the same id
    ///
    /// a credit date on a bank holiday or weekend is refused with
    /// [`PlannerError::UnconfirmedNonBusinessDay`] until the caller repeats
    /// the call with `confirm_non_business_day` set.
    pub fn upsert_special_recharge(
        &mut self,
        recharge: SpecialRecharge,
        confirm_non_business_day: bool,
    ) -> Result<()> {
        validate_special_recharge(&self.overrides, &recharge)?;

        let business_day = self.is_business_day(recharge.credited_on);
        if !business_day && !confirm_non_business_day {
            return Err(PlannerError::UnconfirmedNonBusinessDay {
                date: recharge.credited_on,
            });
        }

        self.events.emit(Event::SpecialRechargeSaved {
            id: recharge.id,
            requested_on: recharge.requested_on,
            credited_on: recharge.credited_on,
            amount: recharge.amount,
            non_business_day_confirmed: !business_day,
        });
        self.overrides.upsert_special_recharge(recharge);
        self.recompute();
        Ok(())
    }

    pub fn remove_special_recharge(&mut self, id: RechargeId) -> Result<SpecialRecharge> {
        let removed = self
            .overrides
            .remove_special_recharge(id)
            .ok_or(PlannerError::RechargeNotFound { id })?;

        self.events.emit(Event::SpecialRechargeRemoved { id });
        self.recompute();
        Ok(removed)
    }

    // day overrides

    /// flip whether the owner spends on `date`
    ///
    /// on weekdays this toggles a non-working override, on weekends an extra
    /// working day. returns the new membership of the touched table.
    pub fn toggle_working_day(&mut self, date: NaiveDate) -> bool {
        if is_weekend(date) {
            self.toggle_extra_working_day(date)
        } else {
            self.toggle_non_working_day(date)
        }
    }

    pub fn toggle_non_working_day(&mut self, date: NaiveDate) -> bool {
        let active = Overrides::toggle(&mut self.overrides.non_working_days, date);
        self.day_toggled(date, DayOverrideKind::NonWorking, active)
    }

    pub fn toggle_extra_working_day(&mut self, date: NaiveDate) -> bool {
        let active = Overrides::toggle(&mut self.overrides.working_days, date);
        self.day_toggled(date, DayOverrideKind::ExtraWorking, active)
    }

    pub fn toggle_holiday(&mut self, date: NaiveDate) -> bool {
        let active = Overrides::toggle(&mut self.params.holidays, date);
        self.day_toggled(date, DayOverrideKind::Holiday, active)
    }

    fn day_toggled(&mut self, date: NaiveDate, kind: DayOverrideKind, active: bool) -> bool {
        self.events.emit(Event::DayOverrideToggled { date, kind, active });
        self.recompute();
        active
    }

    // scalar parameters

    /// apply `change` to a copy of the parameters and commit it if valid
    pub fn update_parameters<F>(&mut self, field: &str, change: F) -> Result<()>
    where
        F: FnOnce(&mut PlannerParameters),
    {
        let mut candidate = self.params.clone();
        change(&mut candidate);
        candidate.validate()?;

        self.params = candidate;
        self.events.emit(Event::ParametersUpdated {
            field: field.to_string(),
        });
        self.recompute();
        Ok(())
    }

    pub fn set_daily_budget(&mut self, amount: Money) -> Result<()> {
        self.update_parameters("daily_budget", |p| p.daily_budget = amount)
    }

    pub fn set_initial_balance(&mut self, amount: Money) -> Result<()> {
        self.update_parameters("initial_balance", |p| p.initial_balance = amount)
    }

    pub fn set_recharge_amount(&mut self, amount: Money) -> Result<()> {
        self.update_parameters("recharge_amount", |p| p.recharge_amount = amount)
    }

    pub fn set_settlement_lag(&mut self, business_days: u32) -> Result<()> {
        self.update_parameters("settlement_lag", |p| p.settlement_lag = business_days)
    }

    pub fn set_minimum_balance(&mut self, amount: Money) -> Result<()> {
        self.update_parameters("minimum_balance", |p| p.minimum_balance = amount)
    }

    pub fn set_rows(&mut self, rows: u32) -> Result<()> {
        self.update_parameters("rows", |p| p.rows = rows)
    }

    pub fn set_schedule(&mut self, schedule: WeeklySchedule) -> Result<()> {
        self.update_parameters("schedule", |p| p.schedule = schedule)
    }

    pub fn set_start_date(&mut self, date: NaiveDate) -> Result<()> {
        self.update_parameters("start_date", |p| p.start_date = date)
    }

    pub fn set_automatic_recharges(&mut self, enabled: bool) -> Result<()> {
        self.update_parameters("automatic_recharges", |p| p.automatic_recharges = enabled)
    }

    /// drop every parameter change and override
    pub fn restore_defaults(&mut self, time_provider: &SafeTimeProvider) {
        self.params = PlannerParameters::defaults(time_provider);
        self.overrides = Overrides::new();
        self.events.emit(Event::DefaultsRestored {
            start_date: self.params.start_date,
        });
        self.recompute();
    }

    /// rebuild the ledger, replacing the events of the previous pass
    fn recompute(&mut self) {
        self.events.retain(|e| !e.is_recompute());
        self.ledger = ledger::recompute(&self.params, &self.overrides, &mut self.events);
    }
}

/// check override tables loaded from outside the planner
pub fn validate_overrides(overrides: &Overrides) -> Result<()> {
    for (date, amount) in &overrides.special_consumptions {
        check_amount(*amount).map_err(|e| PlannerError::InvalidConfiguration {
            message: format!("special consumption on {}: {}", date, e),
        })?;
    }

    for (i, recharge) in overrides.special_recharges.iter().enumerate() {
        check_recharge_values(recharge)?;
        let clash = overrides.special_recharges[..i]
            .iter()
            .any(|other| other.id == recharge.id || other.requested_on == recharge.requested_on);
        if clash {
            return Err(PlannerError::DuplicateRechargeRequest {
                date: recharge.requested_on,
            });
        }
    }

    Ok(())
}

fn validate_special_recharge(overrides: &Overrides, recharge: &SpecialRecharge) -> Result<()> {
    check_recharge_values(recharge)?;

    let clash = overrides
        .special_recharges
        .iter()
        .any(|other| other.id != recharge.id && other.requested_on == recharge.requested_on);
    if clash {
        return Err(PlannerError::DuplicateRechargeRequest {
            date: recharge.requested_on,
        });
    }

    Ok(())
}

fn check_recharge_values(recharge: &SpecialRecharge) -> Result<()> {
    check_amount(recharge.amount)?;
    if recharge.credited_on < recharge.requested_on {
        return Err(PlannerError::InvalidDate {
            message: format!(
                "credit date {} precedes request date {}",
                recharge.credited_on, recharge.requested_on
            ),
        });
    }
    Ok(())
}
