use loyalty_common::Points;
use thiserror::Error;

use crate::db_types::{Balance, NewWithdrawal, UserAccount, Withdrawal};

#[derive(Debug, Clone, Error)]
pub enum BalanceManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested user account {0} does not exist")]
    UserNotFound(i64),
    #[error("A user with login '{0}' already exists")]
    LoginTaken(String),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { requested: Points, available: Points },
    #[error("Amounts must be positive. Got {0}")]
    InvalidAmount(Points),
}

impl From<sqlx::Error> for BalanceManagementError {
    fn from(e: sqlx::Error) -> Self {
        BalanceManagementError::DatabaseError(e.to_string())
    }
}

/// The `BalanceManagement` trait defines behaviour for managing user balances and the withdrawal ledger.
///
/// Every method that changes a balance must be atomic and serialized per user in the backend store, so that concurrent
/// credits and debits for one user never lose updates. Operations on different users are independent.
#[allow(async_fn_in_trait)]
pub trait BalanceManagement {
    /// Creates a user account with a zero balance.
    async fn create_user_account(&self, login: &str) -> Result<UserAccount, BalanceManagementError>;

    /// Fetches the user account with the given id. If no account exists, `None` is returned.
    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, BalanceManagementError>;

    /// Fetches the current balance and lifetime withdrawn total for the user.
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, BalanceManagementError>;

    /// Atomically increases the user's current balance by `amount`, returning the new balance.
    async fn credit_balance(&self, user_id: i64, amount: Points) -> Result<Balance, BalanceManagementError>;

    /// Takes a withdrawal, and in a single atomic transaction,
    /// * checks that the current balance covers the withdrawal sum, failing with `InsufficientFunds` otherwise,
    /// * decreases the current balance by the sum,
    /// * increases the lifetime withdrawn total by the sum,
    /// * appends exactly one entry to the withdrawal ledger.
    ///
    /// Either all of these happen, or none of them do.
    async fn withdraw_with_ledger_entry(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, BalanceManagementError>;

    /// Fetches the user's withdrawal ledger, most recent first.
    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, BalanceManagementError>;
}
