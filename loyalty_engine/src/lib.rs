//! Loyalty Engine
//!
//! The loyalty engine is the core of a loyalty points backend. Users upload the numbers of their purchase orders, an
//! external accrual service decides how many points each purchase earns, and users spend their points against the
//! balance ledger. This library contains the core logic. It knows nothing about HTTP or authentication.
//!
//! The library is divided into these main sections:
//! 1. Database management and control ([`mod@traits`]). Backends implement the traits in this module. SQLite is the
//!    supported backend, and an in-memory backend is available for tests behind the `test_utils` feature. The data
//!    types used in the database are defined in the [`mod@db_types`] module and are public.
//! 2. The accrual service client ([`mod@accrual`]).
//! 3. The engine public API ([`OrderFlowApi`] and [`BalanceApi`]). This provides order uploads, the order lifecycle
//!    passes that the server runs on a timer, and balance withdrawals.
pub mod accrual;
pub mod db_types;
mod engine_api;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use engine_api::{
    balance_api::BalanceApi,
    balance_objects,
    errors::{BalanceApiError, OrderFlowError},
    order_flow_api::OrderFlowApi,
    order_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    BalanceManagement,
    BalanceManagementError,
    LoyaltyDatabase,
    LoyaltyDatabaseError,
    OrderManagement,
    OrderManagementError,
};
