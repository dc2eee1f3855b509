use thiserror::Error;

use crate::{
    accrual::AccrualApiError,
    db_types::{OrderNumber, Points},
    traits::{BalanceManagementError, LoyaltyDatabaseError, OrderManagementError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("'{0}' is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Order {0} has already been uploaded by another user")]
    OwnedByAnotherUser(OrderNumber),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    AccrualError(#[from] AccrualApiError),
}

impl From<OrderManagementError> for OrderFlowError {
    fn from(e: OrderManagementError) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<LoyaltyDatabaseError> for OrderFlowError {
    fn from(e: LoyaltyDatabaseError) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum BalanceApiError {
    #[error("'{0}' is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Withdrawal amounts must be positive. Got {0}")]
    InvalidAmount(Points),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { requested: Points, available: Points },
    #[error("User account {0} does not exist")]
    UserNotFound(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<BalanceManagementError> for BalanceApiError {
    fn from(e: BalanceManagementError) -> Self {
        match e {
            BalanceManagementError::UserNotFound(id) => BalanceApiError::UserNotFound(id),
            BalanceManagementError::InsufficientFunds { requested, available } => {
                BalanceApiError::InsufficientFunds { requested, available }
            },
            BalanceManagementError::InvalidAmount(amount) => BalanceApiError::InvalidAmount(amount),
            e => BalanceApiError::DatabaseError(e.to_string()),
        }
    }
}
