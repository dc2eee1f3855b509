use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use loyalty_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     OrderNumber     ---------------------------------------------------------
/// The purchase-order number a user uploads. Globally unique, and immutable once an order has been created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been uploaded, but has not been registered with the accrual service yet.
    New,
    /// The accrual service has accepted the order and is calculating the reward.
    Processing,
    /// The accrual service refused to calculate a reward for the order. Final.
    Invalid,
    /// The reward has been calculated and credited to the owner's balance. Final.
    Processed,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 4] = [Self::New, Self::Processing, Self::Invalid, Self::Processed];

    /// The transition table for orders. Status changes only move forward:
    ///
    /// | From \ To  | New | Processing | Invalid | Processed |
    /// |------------|-----|------------|---------|-----------|
    /// | New        |     | ✔          |         |           |
    /// | Processing |     |            | ✔       | ✔         |
    /// | Invalid    |     |            |         |           |
    /// | Processed  |     |            |         |           |
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, next), (New, Processing) | (Processing, Invalid) | (Processing, Processed))
    }

    /// All the states from which an order may legally move into `status`.
    pub fn predecessors(status: OrderStatusType) -> Vec<OrderStatusType> {
        Self::ALL.into_iter().filter(|s| s.can_transition_to(status)).collect()
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    pub user_id: i64,
    pub status: OrderStatusType,
    /// Set if, and only if, the status is `Processed`.
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Checks that the accrual field agrees with the order status.
    pub fn check_accrual_invariant(&self) -> Result<(), String> {
        match (self.status, self.accrual) {
            (OrderStatusType::Processed, None) => Err(format!("Processed order {} has no accrual", self.number)),
            (OrderStatusType::Processed, Some(_)) => Ok(()),
            (status, Some(a)) => Err(format!("Order {} has an accrual of {a} but is {status}", self.number)),
            (_, None) => Ok(()),
        }
    }

    /// Returns a copy of this order moved into `status`, with the accrual set to `accrual`.
    /// No checks are made here; backends validate the change when the order is saved.
    pub fn with_status(&self, status: OrderStatusType, accrual: Option<Points>) -> Self {
        Self { status, accrual, ..self.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub number: OrderNumber,
    pub user_id: i64,
}

impl NewOrder {
    pub fn new(number: OrderNumber, user_id: i64) -> Self {
        Self { number, user_id }
    }
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    pub current_balance: Points,
    pub total_withdrawn: Points,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn balance(&self) -> Balance {
        Balance { current: self.current_balance, withdrawn: self.total_withdrawn }
    }
}

//--------------------------------------       Balance         ---------------------------------------------------------
/// The head of a user's ledger: the spendable balance and the lifetime total withdrawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

//--------------------------------------      Withdrawal       ---------------------------------------------------------
/// An append-only ledger entry. Withdrawals are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "order")]
    pub order_number: OrderNumber,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub order_number: OrderNumber,
    pub sum: Points,
}

impl NewWithdrawal {
    pub fn new(user_id: i64, order_number: OrderNumber, sum: Points) -> Self {
        Self { user_id, order_number, sum }
    }
}
