use std::sync::Arc;

use chrono::Utc;
use log::*;
use tokio::sync::Mutex;

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

#[derive(Debug, Default)]
struct MemoryStore {
    users: Vec<UserAccount>,
    orders: Vec<Order>,
    withdrawals: Vec<Withdrawal>,
}

impl MemoryStore {
    fn user_mut(&mut self, user_id: i64) -> Result<&mut UserAccount, BalanceManagementError> {
        self.users.iter_mut().find(|u| u.id == user_id).ok_or(BalanceManagementError::UserNotFound(user_id))
    }

    fn order_index(&self, number: &OrderNumber) -> Option<usize> {
        self.orders.iter().position(|o| &o.number == number)
    }

    /// Applies a status change, enforcing the transition table just like the SQL backend does.
    fn transition(
        &mut self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Option<Points>,
    ) -> Result<usize, OrderManagementError> {
        let idx = self.order_index(number).ok_or_else(|| OrderManagementError::OrderNotFound(number.clone()))?;
        let order = &mut self.orders[idx];
        if !order.status.can_transition_to(status) {
            return Err(OrderManagementError::IllegalStatusTransition {
                number: number.clone(),
                from: order.status,
                to: status,
            });
        }
        order.status = status;
        order.accrual = accrual;
        order.updated_at = Utc::now();
        Ok(idx)
    }
}

/// An in-memory loyalty database. Every operation holds a single store-wide lock for its duration, which gives the
/// same all-or-nothing behaviour as the SQL transactions in [`crate::SqliteDatabase`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    store: Arc<Mutex<MemoryStore>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoyaltyDatabase for MemoryDatabase {
    fn url(&self) -> &str {
        "memory://"
    }

    async fn settle_order(&self, number: &OrderNumber, accrual: Points) -> Result<Order, LoyaltyDatabaseError> {
        let mut store = self.store.lock().await;
        let idx = store.order_index(number).ok_or_else(|| OrderManagementError::OrderNotFound(number.clone()))?;
        let user_id = store.orders[idx].user_id;
        // Check the owner before touching the order, so that a failure leaves nothing half-done
        store.user_mut(user_id)?;
        let idx = store.transition(number, OrderStatusType::Processed, Some(accrual))?;
        store.user_mut(user_id)?.current_balance += accrual;
        trace!("🧠️ Order {number} settled for {accrual}");
        Ok(store.orders[idx].clone())
    }
}

impl OrderManagement for MemoryDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        let mut store = self.store.lock().await;
        if store.order_index(&order.number).is_some() {
            return Err(OrderManagementError::OrderAlreadyExists(order.number));
        }
        if !store.users.iter().any(|u| u.id == order.user_id) {
            return Err(OrderManagementError::DatabaseError(format!(
                "FOREIGN KEY constraint failed: user {} does not exist",
                order.user_id
            )));
        }
        let now = Utc::now();
        let id = store.orders.len() as i64 + 1;
        let order = Order {
            id,
            number: order.number,
            user_id: order.user_id,
            status: OrderStatusType::New,
            accrual: None,
            uploaded_at: now,
            updated_at: now,
        };
        store.orders.push(order.clone());
        Ok(order)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderManagementError> {
        let store = self.store.lock().await;
        Ok(store.orders.iter().find(|o| &o.number == number).cloned())
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError> {
        let store = self.store.lock().await;
        Ok(store.orders.iter().filter(|o| o.user_id == user_id).cloned().collect())
    }

    async fn fetch_orders_by_status(&self, status: OrderStatusType) -> Result<Vec<Order>, OrderManagementError> {
        let store = self.store.lock().await;
        Ok(store.orders.iter().filter(|o| o.status == status).cloned().collect())
    }

    async fn update_order(&self, order: &Order) -> Result<Order, OrderManagementError> {
        if order.status == OrderStatusType::Processed {
            return Err(OrderManagementError::SettlementRequired(order.number.clone()));
        }
        order.check_accrual_invariant().map_err(OrderManagementError::AccrualMismatch)?;
        let mut store = self.store.lock().await;
        let idx = store.transition(&order.number, order.status, order.accrual)?;
        Ok(store.orders[idx].clone())
    }
}

impl BalanceManagement for MemoryDatabase {
    async fn create_user_account(&self, login: &str) -> Result<UserAccount, BalanceManagementError> {
        let mut store = self.store.lock().await;
        if store.users.iter().any(|u| u.login == login) {
            return Err(BalanceManagementError::LoginTaken(login.to_string()));
        }
        let account = UserAccount {
            id: store.users.len() as i64 + 1,
            login: login.to_string(),
            current_balance: Points::default(),
            total_withdrawn: Points::default(),
            created_at: Utc::now(),
        };
        store.users.push(account.clone());
        Ok(account)
    }

    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, BalanceManagementError> {
        let store = self.store.lock().await;
        Ok(store.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, BalanceManagementError> {
        let mut store = self.store.lock().await;
        Ok(store.user_mut(user_id)?.balance())
    }

    async fn credit_balance(&self, user_id: i64, amount: Points) -> Result<Balance, BalanceManagementError> {
        if !amount.is_positive() {
            return Err(BalanceManagementError::InvalidAmount(amount));
        }
        let mut store = self.store.lock().await;
        let user = store.user_mut(user_id)?;
        user.current_balance += amount;
        Ok(user.balance())
    }

    async fn withdraw_with_ledger_entry(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, BalanceManagementError> {
        if !withdrawal.sum.is_positive() {
            return Err(BalanceManagementError::InvalidAmount(withdrawal.sum));
        }
        let mut store = self.store.lock().await;
        let user = store.user_mut(withdrawal.user_id)?;
        if user.current_balance < withdrawal.sum {
            return Err(BalanceManagementError::InsufficientFunds {
                requested: withdrawal.sum,
                available: user.current_balance,
            });
        }
        user.current_balance -= withdrawal.sum;
        user.total_withdrawn += withdrawal.sum;
        let entry = Withdrawal {
            id: store.withdrawals.len() as i64 + 1,
            user_id: withdrawal.user_id,
            order_number: withdrawal.order_number,
            sum: withdrawal.sum,
            processed_at: Utc::now(),
        };
        store.withdrawals.push(entry.clone());
        Ok(entry)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, BalanceManagementError> {
        let store = self.store.lock().await;
        Ok(store.withdrawals.iter().rev().filter(|w| w.user_id == user_id).cloned().collect())
    }
}
