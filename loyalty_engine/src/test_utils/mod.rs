//! Test doubles and environment helpers. Enabled with the `test_utils` feature.
mod memory_db;
pub mod prepare_env;
mod scripted_accrual;

pub use memory_db::MemoryDatabase;
pub use scripted_accrual::ScriptedAccrualService;
