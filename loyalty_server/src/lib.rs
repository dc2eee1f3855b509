//! # Loyalty points server
//! This crate hosts the long-running process for the loyalty points backend. It is responsible for:
//! * Loading the configuration from the environment.
//! * Connecting to (and migrating) the database.
//! * Running the two background workers that drive orders through their lifecycle:
//!   * the submission worker registers `NEW` orders with the accrual service,
//!   * the reconciliation worker collects accrual verdicts for `PROCESSING` orders and credits the owners.
//! * Shutting the workers down cleanly on ctrl-c.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod errors;
pub mod server;
pub mod workers;
