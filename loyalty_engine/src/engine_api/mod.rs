//! # Loyalty engine public API
//!
//! The `engine_api` module exposes the programmatic API for the loyalty engine. This is the surface that an HTTP layer
//! (or the background workers in the server crate) call into.
//!
//! * [`order_flow_api`] handles order uploads and drives the order lifecycle against the accrual service.
//! * [`balance_api`] reads balances and records withdrawals against the ledger.
//!
//! The other submodules in this module are support types for the APIs.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits required by the API.
//!
//! ```rust,ignore
//! use loyalty_engine::{BalanceApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements BalanceManagement
//! let api = BalanceApi::new(db);
//! let balance = api.balance(user_id).await?;
//! ```
pub mod balance_api;
pub mod balance_objects;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
