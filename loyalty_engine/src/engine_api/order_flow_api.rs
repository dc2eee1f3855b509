use std::fmt::Debug;

use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::{random_goods, AccrualApiError, AccrualService, AccrualStatus},
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
    engine_api::{
        errors::OrderFlowError,
        order_objects::{ReconciliationResult, SubmissionResult, UploadOutcome},
    },
    helpers::is_valid_luhn,
    traits::{LoyaltyDatabase, OrderManagementError},
};

/// What happened to a single `PROCESSING` order during a reconciliation pass.
enum Reconciled {
    Processed(Order),
    Invalid(Order),
    Pending,
}

/// `OrderFlowApi` is the primary API for the order lifecycle. It accepts order uploads from users, and moves orders
/// through `NEW → PROCESSING → PROCESSED | INVALID` as the accrual service reports back.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: LoyaltyDatabase
{
    /// Uploads an order number on behalf of `user_id`.
    ///
    /// Surrounding whitespace is ignored. The number must pass the Luhn check.
    /// * If nobody has uploaded the number yet, a new order is stored with status `NEW`.
    /// * If this user uploaded it before, the existing order is returned as [`UploadOutcome::AlreadyExists`].
    /// * If another user owns it, [`OrderFlowError::OwnedByAnotherUser`] is returned.
    ///
    /// Two users racing to upload the same number are resolved by the unique key on the order number: the loser
    /// re-reads the stored order and is classified as above.
    pub async fn upload_order(&self, user_id: i64, raw: &str) -> Result<UploadOutcome, OrderFlowError> {
        let raw = raw.trim();
        if !is_valid_luhn(raw) {
            debug!("🔄️📦️ User #{user_id} tried to upload an invalid order number '{raw}'");
            return Err(OrderFlowError::InvalidOrderNumber(raw.to_string()));
        }
        let number = OrderNumber::from(raw);
        if let Some(existing) = self.db.fetch_order_by_number(&number).await? {
            return classify_existing(user_id, existing);
        }
        match self.db.insert_order(NewOrder::new(number.clone(), user_id)).await {
            Ok(order) => {
                info!("🔄️📦️ Order {number} uploaded by user #{user_id}");
                Ok(UploadOutcome::Created(order))
            },
            Err(OrderManagementError::OrderAlreadyExists(_)) => {
                debug!("🔄️📦️ Order {number} was inserted concurrently. Re-reading it.");
                let existing = self.db.fetch_order_by_number(&number).await?.ok_or_else(|| {
                    error!("🔄️📦️ Order {number} clashed on insert, but cannot be found. This is a data race bug.");
                    OrderFlowError::DatabaseError(format!("Order {number} vanished after a duplicate-key error"))
                })?;
                classify_existing(user_id, existing)
            },
            Err(e) => {
                error!("🔄️📦️ Could not store order {number} for user #{user_id}. {e}");
                Err(e.into())
            },
        }
    }

    /// The user's orders, oldest upload first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        trace!("🔄️📦️ {} orders fetched for user #{user_id}", orders.len());
        Ok(orders)
    }

    /// Registers every `NEW` order with the accrual service and moves the accepted ones to `PROCESSING`.
    ///
    /// Failures are per order: an order that could not be registered (or saved) stays `NEW` and is retried on the next
    /// pass, and the rest of the pass carries on. The only error returned is a failure to fetch the `NEW` orders.
    ///
    /// If `cancel` fires, the pass finishes the order it is working on and stops.
    pub async fn submit_new_orders<A: AccrualService>(
        &self,
        accrual: &A,
        cancel: &CancellationToken,
    ) -> Result<SubmissionResult, OrderFlowError> {
        let orders = self.db.fetch_orders_by_status(OrderStatusType::New).await?;
        let mut result = SubmissionResult::default();
        for order in orders {
            if cancel.is_cancelled() {
                debug!("📤️ Submission pass cancelled before {}", order.number);
                result.cancelled = true;
                break;
            }
            match self.submit_order(accrual, &order).await {
                Ok(()) => result.submitted.push(order.number),
                Err(e) => {
                    warn!("📤️ Order {} could not be submitted. It will be retried. {e}", order.number);
                    result.failed.push((order.number, e.to_string()));
                },
            }
        }
        Ok(result)
    }

    async fn submit_order<A: AccrualService>(&self, accrual: &A, order: &Order) -> Result<(), OrderFlowError> {
        let goods = random_goods();
        accrual.register_order(&order.number, &goods).await?;
        trace!("📤️ Order {} registered with the accrual service", order.number);
        let updated = self.db.update_order(&order.with_status(OrderStatusType::Processing, None)).await?;
        debug!("📤️ Order {} is now {}", updated.number, updated.status);
        Ok(())
    }

    /// Asks the accrual service about every `PROCESSING` order, and applies the final verdicts.
    ///
    /// * `PROCESSED` settles the order: the status, the accrual and the owner's balance credit are stored together, so
    ///   the accrual is credited exactly once.
    /// * `INVALID` marks the order invalid. Nothing is credited.
    /// * `REGISTERED`, `PROCESSING`, no registration, and status strings we do not recognise leave the order as it is.
    ///
    /// As with [`Self::submit_new_orders`], failures are isolated per order and the pass stops early on `cancel`.
    pub async fn reconcile_processing_orders<A: AccrualService>(
        &self,
        accrual: &A,
        cancel: &CancellationToken,
    ) -> Result<ReconciliationResult, OrderFlowError> {
        let orders = self.db.fetch_orders_by_status(OrderStatusType::Processing).await?;
        let mut result = ReconciliationResult::default();
        for order in orders {
            if cancel.is_cancelled() {
                debug!("📥️ Reconciliation pass cancelled before {}", order.number);
                result.cancelled = true;
                break;
            }
            let number = order.number.clone();
            match self.reconcile_order(accrual, order).await {
                Ok(Reconciled::Processed(order)) => result.processed.push(order),
                Ok(Reconciled::Invalid(order)) => result.invalid.push(order),
                Ok(Reconciled::Pending) => result.pending.push(number),
                Err(e) => {
                    warn!("📥️ Order {number} could not be reconciled. It will be retried. {e}");
                    result.failed.push((number, e.to_string()));
                },
            }
        }
        Ok(result)
    }

    async fn reconcile_order<A: AccrualService>(&self, accrual: &A, order: Order) -> Result<Reconciled, OrderFlowError> {
        let Some(status) = accrual.fetch_order_status(&order.number).await? else {
            trace!("📥️ Order {} is not registered with the accrual service yet", order.number);
            return Ok(Reconciled::Pending);
        };
        match status.status {
            AccrualStatus::Registered | AccrualStatus::Processing => {
                trace!("📥️ Order {} is still {} at the accrual service", order.number, status.status);
                Ok(Reconciled::Pending)
            },
            AccrualStatus::Processed => {
                let amount = status.accrual.ok_or_else(|| AccrualApiError::MissingAccrual(order.number.to_string()))?;
                let settled = self.db.settle_order(&order.number, amount).await?;
                info!("📥️ Order {} processed. User #{} credited with {amount}", settled.number, settled.user_id);
                Ok(Reconciled::Processed(settled))
            },
            AccrualStatus::Invalid => {
                let updated = self.db.update_order(&order.with_status(OrderStatusType::Invalid, None)).await?;
                info!("📥️ Order {} was rejected by the accrual service", updated.number);
                Ok(Reconciled::Invalid(updated))
            },
            AccrualStatus::Unknown(s) => {
                warn!("📥️ Order {} has an unrecognised accrual status '{s}'. Leaving it as it is.", order.number);
                Ok(Reconciled::Pending)
            },
        }
    }
}

fn classify_existing(user_id: i64, existing: Order) -> Result<UploadOutcome, OrderFlowError> {
    if existing.user_id == user_id {
        debug!("🔄️📦️ User #{user_id} uploaded order {} again", existing.number);
        Ok(UploadOutcome::AlreadyExists(existing))
    } else {
        debug!("🔄️📦️ User #{user_id} tried to upload order {}, which belongs to someone else", existing.number);
        Err(OrderFlowError::OwnedByAnotherUser(existing.number))
    }
}
