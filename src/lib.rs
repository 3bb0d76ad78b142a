pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod overrides;
pub mod planner;
pub mod serialization;
pub mod state;
pub mod types;

// re-export key types
pub use calendar::CalendarRules;
pub use config::{ParametersBuilder, PlannerParameters};
pub use decimal::Money;
pub use errors::{PlannerError, Result};
pub use events::{DayOverrideKind, Event, EventStore};
pub use ledger::{
    finalize_projections, recompute, Ledger, LedgerContext, RechargeScheduler, Row,
    SettlementProjector,
};
pub use overrides::Overrides;
pub use planner::Planner;
pub use serialization::{LedgerSummary, LedgerView};
pub use state::PlannerSnapshot;
pub use types::{
    parse_amount, parse_date, RechargeId, RechargeOrigin, RechargeRecord, SpecialRecharge,
    WeeklySchedule,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
