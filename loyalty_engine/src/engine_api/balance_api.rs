//! Reading balances and spending points.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Balance, NewWithdrawal, OrderNumber, UserAccount, Withdrawal},
    engine_api::{balance_objects::WithdrawalRequest, errors::BalanceApiError},
    helpers::is_valid_luhn,
    traits::BalanceManagement,
};

/// The `BalanceApi` provides access to user balances and the withdrawal ledger.
pub struct BalanceApi<B> {
    db: B,
}

impl<B: Debug> Debug for BalanceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BalanceApi ({:?})", self.db)
    }
}

impl<B> BalanceApi<B>
where B: BalanceManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new user account with an empty balance.
    pub async fn create_account(&self, login: &str) -> Result<UserAccount, BalanceApiError> {
        let account = self.db.create_user_account(login).await?;
        info!("💰️ Created account #{} for '{login}'", account.id);
        Ok(account)
    }

    pub async fn balance(&self, user_id: i64) -> Result<Balance, BalanceApiError> {
        let balance = self.db.fetch_balance(user_id).await?;
        Ok(balance)
    }

    /// Spends `request.sum` points from the user's balance against `request.order`.
    ///
    /// The order number only attributes the ledger entry, so it need not be one of the user's uploads, but it must pass
    /// the Luhn check. The balance check, the debit and the ledger entry happen as one atomic unit in the backend.
    pub async fn withdraw(&self, user_id: i64, request: WithdrawalRequest) -> Result<Withdrawal, BalanceApiError> {
        let order = request.order.trim();
        if !is_valid_luhn(order) {
            debug!("💸️ User #{user_id} tried to withdraw against an invalid order number '{order}'");
            return Err(BalanceApiError::InvalidOrderNumber(order.to_string()));
        }
        if !request.sum.is_positive() {
            return Err(BalanceApiError::InvalidAmount(request.sum));
        }
        let withdrawal = NewWithdrawal::new(user_id, OrderNumber::from(order), request.sum);
        match self.db.withdraw_with_ledger_entry(withdrawal).await {
            Ok(entry) => {
                info!("💸️ User #{user_id} withdrew {} against order {}", entry.sum, entry.order_number);
                Ok(entry)
            },
            Err(e) => {
                debug!("💸️ Withdrawal of {} for user #{user_id} was refused. {e}", request.sum);
                Err(e.into())
            },
        }
    }

    /// The user's withdrawals, most recent first.
    pub async fn withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, BalanceApiError> {
        let entries = self.db.fetch_withdrawals_for_user(user_id).await?;
        trace!("💸️ {} withdrawals fetched for user #{user_id}", entries.len());
        Ok(entries)
    }
}
