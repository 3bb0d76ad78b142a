use chrono::NaiveDate;

use crate::calendar::CalendarRules;
use crate::decimal::Money;
use crate::ledger::{CreditSchedule, Ledger};

/// projects when a recharge requested on a given day is credited, and what
/// the balance looks like at that point
#[derive(Debug, Clone, Copy)]
pub struct SettlementProjector<'a> {
    calendar: CalendarRules<'a>,
    lag: u32,
    fallback: Money,
}

impl<'a> SettlementProjector<'a> {
    /// `fallback` is reported when the settlement day lies beyond the ledger
    pub fn new(calendar: CalendarRules<'a>, lag: u32, fallback: Money) -> Self {
        Self {
            calendar,
            lag,
            fallback,
        }
    }

    pub fn lag(&self) -> u32 {
        self.lag
    }

    /// credit date for a request made on `request`
    ///
    /// with a lag of zero the request settles the same day. otherwise the
    /// result is the lag-th business day strictly after the request.
    pub fn settlement_date(&self, request: NaiveDate) -> NaiveDate {
        self.settlement_date_with_lag(request, self.lag)
    }

    pub fn settlement_date_with_lag(&self, request: NaiveDate, lag: u32) -> NaiveDate {
        let mut day = request;
        let mut counted = 0;
        while counted < lag {
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
            if self.calendar.is_business_day(day) {
                counted += 1;
            }
        }
        day
    }

    /// balance expected on the settlement date of a request made on `date`
    ///
    /// credits dated `date` that the ledger has not absorbed yet are added on
    /// top; a settlement date outside the ledger yields the fallback.
    pub fn projected_balance(&self, ledger: &Ledger, credits: &CreditSchedule, date: NaiveDate) -> Money {
        let settle = self.settlement_date(date);
        match ledger.row(settle) {
            Some(row) => {
                let reflected = ledger
                    .row(date)
                    .map(|r| r.credited_amount)
                    .unwrap_or(Money::ZERO);
                let pending = (credits.on(date) - reflected).max(Money::ZERO);
                row.closing_balance + pending
            }
            None => {
                log::trace!("projection for {} settles {} beyond the ledger", date, settle);
                self.fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerParameters;
    use crate::overrides::Overrides;

    // 2025-06-02 is a monday
    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn params_with_holidays(holidays: &[NaiveDate]) -> PlannerParameters {
        let mut params = PlannerParameters::defaults_from(date(2));
        params.holidays = holidays.iter().copied().collect();
        params
    }

    #[test]
    fn test_zero_lag_settles_same_day() {
        let params = params_with_holidays(&[]);
        let overrides = Overrides::new();
        let projector = SettlementProjector::new(CalendarRules::new(&params, &overrides), 0, Money::ZERO);

        assert_eq!(projector.settlement_date(date(2)), date(2));
        // even on a weekend
        assert_eq!(projector.settlement_date(date(7)), date(7));
    }

    #[test]
    fn test_lag_counts_business_days_after_request() {
        let params = params_with_holidays(&[]);
        let overrides = Overrides::new();
        let projector = SettlementProjector::new(CalendarRules::new(&params, &overrides), 3, Money::ZERO);

        assert_eq!(projector.settlement_date(date(2)), date(5));
        // thursday + 3 skips the weekend
        assert_eq!(projector.settlement_date(date(5)), date(10));
        // saturday request: mon, tue, wed
        assert_eq!(projector.settlement_date(date(7)), date(11));
    }

    #[test]
    fn test_holidays_are_skipped() {
        let params = params_with_holidays(&[date(3), date(4)]);
        let overrides = Overrides::new();
        let projector = SettlementProjector::new(CalendarRules::new(&params, &overrides), 1, Money::ZERO);

        assert_eq!(projector.settlement_date(date(2)), date(5));
    }

    #[test]
    fn test_working_overrides_do_not_shift_settlement() {
        let params = params_with_holidays(&[]);
        let mut overrides = Overrides::new();
        overrides.non_working_days.insert(date(3));
        overrides.working_days.insert(date(7));
        let projector = SettlementProjector::new(CalendarRules::new(&params, &overrides), 2, Money::ZERO);

        assert_eq!(projector.settlement_date(date(2)), date(4));
        assert_eq!(projector.settlement_date(date(6)), date(10));
    }

    #[test]
    fn test_settlement_strictly_increases_with_lag() {
        let params = params_with_holidays(&[date(6)]);
        let overrides = Overrides::new();
        let projector = SettlementProjector::new(CalendarRules::new(&params, &overrides), 0, Money::ZERO);

        for start in 1..=14 {
            let request = date(start);
            assert_eq!(projector.settlement_date_with_lag(request, 0), request);
            for lag in 1..=10 {
                let previous = projector.settlement_date_with_lag(request, lag - 1);
                let current = projector.settlement_date_with_lag(request, lag);
                assert!(current > previous, "{} lag {}", request, lag);
                assert!(projector.calendar.is_business_day(current));
            }
        }
    }
}
