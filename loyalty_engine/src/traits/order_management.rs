use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderNumber, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since order {0} already exists")]
    OrderAlreadyExists(OrderNumber),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Order {number} cannot move from {from} to {to}")]
    IllegalStatusTransition { number: OrderNumber, from: OrderStatusType, to: OrderStatusType },
    #[error("Order accrual does not match its status. {0}")]
    AccrualMismatch(String),
    #[error("Order {0} can only be marked as processed by settling it")]
    SettlementRequired(OrderNumber),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the behaviour for storing and querying uploaded orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a brand-new order with status `New`.
    ///
    /// The order number is unique across all users. If it is already taken (including by a concurrent insert that
    /// won the race), `OrderAlreadyExists` is returned and nothing is changed.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError>;

    /// Fetches the order with the given number. If no order exists, `None` is returned.
    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderManagementError>;

    /// Fetches all the orders uploaded by the user, oldest first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError>;

    /// Fetches all orders with the given status, in no particular order.
    async fn fetch_orders_by_status(&self, status: OrderStatusType) -> Result<Vec<Order>, OrderManagementError>;

    /// Overwrites the mutable fields (status and accrual) of the stored order with those of `order`.
    ///
    /// The write is rejected with `IllegalStatusTransition` if the stored status may not move to the new one, and with
    /// `AccrualMismatch` if an accrual is given.
    ///
    /// This does **not** credit any balance, so a new status of `Processed` is refused with `SettlementRequired`. Use
    /// [`LoyaltyDatabase::settle_order`](crate::LoyaltyDatabase) to move an order to `Processed`.
    async fn update_order(&self, order: &Order) -> Result<Order, OrderManagementError>;
}
