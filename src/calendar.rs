//! Calendar rules for spending days and bank business days.
//!
//! Two independent notions of a "day off" exist. Working days govern whether
//! the account owner spends against the daily budget; they follow the weekly
//! schedule plus manual overrides. Business days govern settlement counting;
//! they are Monday to Friday minus holidays, and manual working-day overrides
//! never touch them.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::config::PlannerParameters;
use crate::overrides::Overrides;

/// pure date classification over one parameter snapshot
#[derive(Debug, Clone, Copy)]
pub struct CalendarRules<'a> {
    params: &'a PlannerParameters,
    overrides: &'a Overrides,
}

impl<'a> CalendarRules<'a> {
    pub fn new(params: &'a PlannerParameters, overrides: &'a Overrides) -> Self {
        Self { params, overrides }
    }

    /// whether the owner spends on `date`
    ///
    /// a manual working-day override wins over everything, weekends included.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        let scheduled = self.params.schedule.includes_date(date);
        (scheduled && !self.overrides.is_non_working(date)) || self.overrides.is_extra_working(date)
    }

    /// whether the bank processes requests on `date`
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.params.is_holiday(date)
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
