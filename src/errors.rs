use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::Money;
use crate::types::RechargeId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("invalid amount: {input:?}")]
    InvalidAmount {
        input: String,
    },

    #[error("amount must not be negative: {amount}")]
    NegativeAmount {
        amount: Money,
    },

    #[error("amount {amount} exceeds the largest accepted amount {max}")]
    AmountTooLarge {
        amount: Money,
        max: Money,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("{date} is not a bank business day; confirmation required")]
    UnconfirmedNonBusinessDay {
        date: NaiveDate,
    },

    #[error("a recharge is already requested on {date}")]
    DuplicateRechargeRequest {
        date: NaiveDate,
    },

    #[error("recharge not found: {id}")]
    RechargeNotFound {
        id: RechargeId,
    },

    #[error("serialization error: {message}")]
    Serialization {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, PlannerError>;

impl From<serde_json::Error> for PlannerError {
    fn from(e: serde_json::Error) -> Self {
        PlannerError::Serialization {
            message: e.to_string(),
        }
    }
}
