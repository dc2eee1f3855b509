//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{new_pool, orders, users, withdrawals};
use crate::{
    db_types::{Balance, NewOrder, NewWithdrawal, Order, OrderNumber, OrderStatusType, Points, UserAccount, Withdrawal},
    traits::{
        BalanceManagement,
        BalanceManagementError,
        LoyaltyDatabase,
        LoyaltyDatabaseError,
        OrderManagement,
        OrderManagementError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LoyaltyDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn settle_order(&self, number: &OrderNumber, accrual: Points) -> Result<Order, LoyaltyDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_status(number, OrderStatusType::Processed, Some(accrual), &mut tx).await?;
        trace!("🗃️ Order {number} marked as processed with an accrual of {accrual}");
        let account = users::credit(order.user_id, accrual, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {number} settled. Account #{} credited with {accrual}. Balance is now {}",
            account.id, account.current_balance
        );
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), LoyaltyDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_orders_by_status(&self, status: OrderStatusType) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_by_status(status, &mut conn).await?;
        Ok(orders)
    }

    async fn update_order(&self, order: &Order) -> Result<Order, OrderManagementError> {
        if order.status == OrderStatusType::Processed {
            return Err(OrderManagementError::SettlementRequired(order.number.clone()));
        }
        order.check_accrual_invariant().map_err(OrderManagementError::AccrualMismatch)?;
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(&order.number, order.status, order.accrual, &mut conn).await
    }
}

impl BalanceManagement for SqliteDatabase {
    async fn create_user_account(&self, login: &str) -> Result<UserAccount, BalanceManagementError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(login, &mut conn).await
    }

    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, BalanceManagementError> {
        let mut conn = self.pool.acquire().await?;
        let account = users::user_account_by_id(user_id, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, BalanceManagementError> {
        self.fetch_user_account(user_id)
            .await?
            .map(|acc| acc.balance())
            .ok_or(BalanceManagementError::UserNotFound(user_id))
    }

    async fn credit_balance(&self, user_id: i64, amount: Points) -> Result<Balance, BalanceManagementError> {
        if !amount.is_positive() {
            return Err(BalanceManagementError::InvalidAmount(amount));
        }
        let mut conn = self.pool.acquire().await?;
        let account = users::credit(user_id, amount, &mut conn).await?;
        Ok(account.balance())
    }

    async fn withdraw_with_ledger_entry(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, BalanceManagementError> {
        if !withdrawal.sum.is_positive() {
            return Err(BalanceManagementError::InvalidAmount(withdrawal.sum));
        }
        let user_id = withdrawal.user_id;
        let mut tx = self.pool.begin().await?;
        let account = users::debit(user_id, withdrawal.sum, &mut tx).await?;
        let entry = withdrawals::insert_withdrawal(withdrawal, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Withdrawal #{} of {} against order {} recorded for account #{user_id}. Balance is now {}",
            entry.id, entry.sum, entry.order_number, account.current_balance
        );
        Ok(entry)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, BalanceManagementError> {
        let mut conn = self.pool.acquire().await?;
        let entries = withdrawals::withdrawals_for_user(user_id, &mut conn).await?;
        Ok(entries)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, with a pool of up to `max_connections` connections to `url`.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the database schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
