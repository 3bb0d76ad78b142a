use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::RechargeId;

/// which manual day table a toggle touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOverrideKind {
    NonWorking,
    ExtraWorking,
    Holiday,
}

/// all events that can be emitted by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // recomputation events
    LedgerRecomputed {
        start_date: NaiveDate,
        rows: usize,
        recharges: usize,
        automatic_recharges: usize,
    },
    RechargeScheduled {
        id: RechargeId,
        requested_on: NaiveDate,
        credited_on: NaiveDate,
        amount: Money,
        projected_balance: Money,
        minimum_balance: Money,
    },
    SpecialRechargeAdopted {
        id: RechargeId,
        requested_on: NaiveDate,
        credited_on: NaiveDate,
        amount: Money,
    },
    RechargeBeyondHorizon {
        id: RechargeId,
        requested_on: NaiveDate,
        credited_on: NaiveDate,
    },

    // override events
    SpecialConsumptionSet {
        date: NaiveDate,
        amount: Money,
    },
    SpecialConsumptionCleared {
        date: NaiveDate,
    },
    SpecialRechargeSaved {
        id: RechargeId,
        requested_on: NaiveDate,
        credited_on: NaiveDate,
        amount: Money,
        non_business_day_confirmed: bool,
    },
    SpecialRechargeRemoved {
        id: RechargeId,
    },
    DayOverrideToggled {
        date: NaiveDate,
        kind: DayOverrideKind,
        active: bool,
    },

    // parameter events
    ParametersUpdated {
        field: String,
    },
    DefaultsRestored {
        start_date: NaiveDate,
    },
}

impl Event {
    /// emitted by a ledger recomputation rather than by a host mutation
    pub fn is_recompute(&self) -> bool {
        matches!(
            self,
            Event::LedgerRecomputed { .. }
                | Event::RechargeScheduled { .. }
                | Event::SpecialRechargeAdopted { .. }
                | Event::RechargeBeyondHorizon { .. }
        )
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// keep only the events matching `keep`
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Event) -> bool,
    {
        self.events.retain(keep);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
