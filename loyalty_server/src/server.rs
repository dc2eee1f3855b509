use log::*;
use loyalty_engine::{accrual::AccrualClient, LoyaltyDatabase, SqliteDatabase};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    workers::{start_reconciliation_worker, start_submission_worker},
};

/// Runs the loyalty server until ctrl-c is pressed.
///
/// Startup failures (configuration, database, accrual client) are returned as errors. Once both workers are running,
/// nothing short of the shutdown signal stops them.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    let mut db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    } else {
        info!("🚀️ Skipping database migrations");
    }
    let accrual = AccrualClient::new(&config.accrual_address, config.accrual_timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Using the accrual service at {}", accrual.base_url());

    let shutdown = CancellationToken::new();
    let submission =
        start_submission_worker(db.clone(), accrual.clone(), config.submission_interval, shutdown.clone());
    let reconciliation =
        start_reconciliation_worker(db.clone(), accrual, config.reconciliation_interval, shutdown.clone());

    let signal_result = signal::ctrl_c().await;
    info!("🚀️ Shutting down. Waiting for the workers to finish.");
    shutdown.cancel();
    for (name, handle) in [("submission", submission), ("reconciliation", reconciliation)] {
        if let Err(e) = handle.await {
            error!("🚀️ The {name} worker did not shut down cleanly. {e}");
        }
    }
    if let Err(e) = db.close().await {
        warn!("🚀️ Error closing the database. {e}");
    }
    signal_result?;
    Ok(())
}
