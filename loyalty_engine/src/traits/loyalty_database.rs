use thiserror::Error;

use crate::{
    db_types::{Order, OrderNumber, Points},
    traits::{BalanceManagement, BalanceManagementError, OrderManagement, OrderManagementError},
};

/// This trait defines the highest level of behaviour for backends supporting the loyalty engine.
///
/// On top of order storage and the balance ledger, a backend must provide the atomic units of work that touch both:
/// * Settling an order: the `Processing` to `Processed` transition, recording the accrual and crediting the owner's
///   balance.
#[allow(async_fn_in_trait)]
pub trait LoyaltyDatabase: Clone + OrderManagement + BalanceManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Settles the order identified by `number`, in a single atomic transaction:
    /// * The order status moves from `Processing` to `Processed`,
    /// * The accrual is stored on the order,
    /// * The owner's current balance is increased by the accrual.
    ///
    /// The credit is applied exactly once. If the order is not `Processing` (e.g. it was already settled), an
    /// `IllegalStatusTransition` error is returned and no balance is changed.
    ///
    /// Returns the settled order.
    async fn settle_order(&self, number: &OrderNumber, accrual: Points) -> Result<Order, LoyaltyDatabaseError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LoyaltyDatabaseError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LoyaltyDatabaseError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    OrderError(#[from] OrderManagementError),
    #[error("{0}")]
    BalanceError(#[from] BalanceManagementError),
}

impl From<sqlx::Error> for LoyaltyDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        LoyaltyDatabaseError::DatabaseError(e.to_string())
    }
}
