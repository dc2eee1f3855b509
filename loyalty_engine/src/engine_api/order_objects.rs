use std::fmt::Display;

use serde::Serialize;

use crate::db_types::{Order, OrderNumber};

/// The successful results of an order upload. Both variants carry the stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "order", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The order was new, and has been stored with status `NEW`.
    Created(Order),
    /// The same user had already uploaded this order. Nothing was changed.
    AlreadyExists(Order),
}

impl UploadOutcome {
    pub fn order(&self) -> &Order {
        match self {
            UploadOutcome::Created(order) | UploadOutcome::AlreadyExists(order) => order,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, UploadOutcome::Created(_))
    }
}

/// The outcome of one pass over the `NEW` orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionResult {
    /// Orders that were accepted by the accrual service and moved to `PROCESSING`.
    pub submitted: Vec<OrderNumber>,
    /// Orders that stay `NEW` until the next pass, with the reason.
    pub failed: Vec<(OrderNumber, String)>,
    /// Set if the pass stopped early because of a shutdown request.
    pub cancelled: bool,
}

impl SubmissionResult {
    pub fn is_empty(&self) -> bool {
        self.submitted.is_empty() && self.failed.is_empty()
    }
}

impl Display for SubmissionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} submitted, {} failed", self.submitted.len(), self.failed.len())?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// The outcome of one pass over the `PROCESSING` orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// Orders that were settled. The accrual has been credited to the owner.
    pub processed: Vec<Order>,
    /// Orders that the accrual service refused.
    pub invalid: Vec<Order>,
    /// Orders the accrual service is not done with yet (or does not know about). They are checked again next pass.
    pub pending: Vec<OrderNumber>,
    /// Orders that could not be reconciled this pass, with the reason.
    pub failed: Vec<(OrderNumber, String)>,
    /// Set if the pass stopped early because of a shutdown request.
    pub cancelled: bool,
}

impl ReconciliationResult {
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty() && self.invalid.is_empty() && self.pending.is_empty() && self.failed.is_empty()
    }
}

impl Display for ReconciliationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} processed, {} invalid, {} pending, {} failed",
            self.processed.len(),
            self.invalid.len(),
            self.pending.len(),
            self.failed.len()
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}
