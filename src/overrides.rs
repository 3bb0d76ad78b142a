use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::decimal::Money;
use crate::types::{RechargeId, SpecialRecharge};

/// user-entered exceptions read by the ledger builder and scheduler
///
/// the tables are plain data; every check on their contents happens in
/// [`crate::planner::Planner`] before a change is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    /// consumption replacing the budget rule on a given day
    #[serde(default)]
    pub special_consumptions: BTreeMap<NaiveDate, Money>,
    /// user-entered recharges, in entry order
    #[serde(default)]
    pub special_recharges: Vec<SpecialRecharge>,
    /// scheduled days the owner does not spend
    #[serde(default)]
    pub non_working_days: BTreeSet<NaiveDate>,
    /// unscheduled days the owner does spend
    #[serde(default)]
    pub working_days: BTreeSet<NaiveDate>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn special_consumption(&self, date: NaiveDate) -> Option<Money> {
        self.special_consumptions.get(&date).copied()
    }

    /// first special recharge requested on `date`
    pub fn special_recharge_requested_on(&self, date: NaiveDate) -> Option<&SpecialRecharge> {
        self.special_recharges.iter().find(|r| r.requested_on == date)
    }

    pub fn special_recharge(&self, id: RechargeId) -> Option<&SpecialRecharge> {
        self.special_recharges.iter().find(|r| r.id == id)
    }

    pub fn is_special_recharge(&self, id: RechargeId) -> bool {
        self.special_recharge(id).is_some()
    }

    pub fn is_non_working(&self, date: NaiveDate) -> bool {
        self.non_working_days.contains(&date)
    }

    pub fn is_extra_working(&self, date: NaiveDate) -> bool {
        self.working_days.contains(&date)
    }

    /// add or replace a recharge, matching on id
    pub fn upsert_special_recharge(&mut self, recharge: SpecialRecharge) {
        match self.special_recharges.iter_mut().find(|r| r.id == recharge.id) {
            Some(existing) => *existing = recharge,
            None => self.special_recharges.push(recharge),
        }
    }

    pub fn remove_special_recharge(&mut self, id: RechargeId) -> Option<SpecialRecharge> {
        let index = self.special_recharges.iter().position(|r| r.id == id)?;
        Some(self.special_recharges.remove(index))
    }

    /// flip membership of `date` in `set`, returning the new membership
    pub(crate) fn toggle(set: &mut BTreeSet<NaiveDate>, date: NaiveDate) -> bool {
        if set.remove(&date) {
            false
        } else {
            set.insert(date);
            true
        }
    }
}
