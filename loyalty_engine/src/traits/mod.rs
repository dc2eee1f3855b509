//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the loyalty engine database *backends*.
//!
//! The engine never talks to a concrete storage technology. The public APIs are generic over these traits, and a
//! backend (SQLite, or the in-memory test double) implements them.
//!
//! * [`OrderManagement`] stores uploaded orders and lets them be queried by number, owner and status.
//! * [`BalanceManagement`] owns user balances and the append-only withdrawal ledger.
//! * [`LoyaltyDatabase`] is the highest level of behaviour, and carries the atomic units of work that span both
//!   orders and balances.
//!
//! Backends are responsible for enforcing the order status transition table (see
//! [`OrderStatusType::can_transition_to`](crate::db_types::OrderStatusType::can_transition_to)) on every write, and
//! for serializing balance changes per user in the store itself.
mod balance_management;
mod loyalty_database;
mod order_management;

pub use balance_management::{BalanceManagement, BalanceManagementError};
pub use loyalty_database::{LoyaltyDatabase, LoyaltyDatabaseError};
pub use order_management::{OrderManagement, OrderManagementError};
