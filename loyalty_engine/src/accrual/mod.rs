//! # Accrual service client
//!
//! The accrual service is the external system that computes the loyalty reward for a purchase order. The engine
//! talks to it through the [`AccrualService`] trait, so that the background workers can be driven by a test double.
//! [`AccrualClient`] is the HTTP+JSON implementation.
//!
//! Registration is idempotent on the accrual side, keyed by order number. A `409 Conflict` on registration is
//! therefore as good as a `202 Accepted`.
mod client;
mod errors;
mod goods;
mod objects;

pub use client::{AccrualClient, DEFAULT_ACCRUAL_TIMEOUT};
pub use errors::AccrualApiError;
pub use goods::random_goods;
pub use objects::{AccrualOrderStatus, AccrualStatus, Good, RegisterOrderRequest};

use crate::db_types::OrderNumber;

#[allow(async_fn_in_trait)]
pub trait AccrualService {
    /// Registers the order with the accrual service. The goods manifest is request padding only.
    ///
    /// Succeeds if the order was accepted, or if the service already knows about it.
    async fn register_order(&self, number: &OrderNumber, goods: &[Good]) -> Result<(), AccrualApiError>;

    /// Fetches the current accrual status of an order. `None` means the service has no registration for it.
    async fn fetch_order_status(&self, number: &OrderNumber) -> Result<Option<AccrualOrderStatus>, AccrualApiError>;
}
