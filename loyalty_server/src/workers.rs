//! The background workers that move orders through their lifecycle.
//!
//! Each worker is a long-lived task that owns a timer and a handle to the shared database. The workers never talk to
//! each other; the database is the only state they share. Both stop when the shared [`CancellationToken`] fires. A
//! pass that is under way when that happens finishes the order it is working on and starts no new ones.
use std::time::Duration;

use log::*;
use loyalty_engine::{
    accrual::{AccrualClient, AccrualService},
    db_types::{Order, OrderNumber},
    LoyaltyDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

/// Starts the submission worker. The returned handle completes once `shutdown` has been cancelled.
pub fn start_submission_worker(
    db: SqliteDatabase,
    accrual: AccrualClient,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_submission_worker(OrderFlowApi::new(db), accrual, period, shutdown))
}

/// Starts the reconciliation worker. The returned handle completes once `shutdown` has been cancelled.
pub fn start_reconciliation_worker(
    db: SqliteDatabase,
    accrual: AccrualClient,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_reconciliation_worker(OrderFlowApi::new(db), accrual, period, shutdown))
}

/// A timer whose first tick fires one `period` from now. If a pass overruns, the next one is pushed back rather than
/// run in a burst.
fn worker_timer(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

pub async fn run_submission_worker<B, A>(
    api: OrderFlowApi<B>,
    accrual: A,
    period: Duration,
    shutdown: CancellationToken,
) where
    B: LoyaltyDatabase,
    A: AccrualService,
{
    let mut timer = worker_timer(period);
    info!("📤️ Submission worker started. Running every {}s", period.as_secs_f32());
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = timer.tick() => {
                trace!("📤️ Running submission pass");
                match api.submit_new_orders(&accrual, &shutdown).await {
                    Ok(result) if result.is_empty() => trace!("📤️ No new orders to submit"),
                    Ok(result) => {
                        info!("📤️ Submission pass complete. {result}");
                        if !result.failed.is_empty() {
                            debug!("📤️ Orders left for the next pass: {}", number_list(&result.failed));
                        }
                    },
                    Err(e) => error!("📤️ Error running the submission pass. {e}"),
                }
            }
        }
    }
    info!("📤️ Submission worker stopped");
}

pub async fn run_reconciliation_worker<B, A>(
    api: OrderFlowApi<B>,
    accrual: A,
    period: Duration,
    shutdown: CancellationToken,
) where
    B: LoyaltyDatabase,
    A: AccrualService,
{
    let mut timer = worker_timer(period);
    info!("📥️ Reconciliation worker started. Running every {}s", period.as_secs_f32());
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = timer.tick() => {
                trace!("📥️ Running reconciliation pass");
                match api.reconcile_processing_orders(&accrual, &shutdown).await {
                    Ok(result) if result.is_empty() => trace!("📥️ No orders awaiting accrual"),
                    Ok(result) => {
                        info!("📥️ Reconciliation pass complete. {result}");
                        if !result.processed.is_empty() {
                            debug!("📥️ Processed: {}", order_list(&result.processed));
                        }
                        if !result.invalid.is_empty() {
                            debug!("📥️ Invalid: {}", order_list(&result.invalid));
                        }
                        if !result.failed.is_empty() {
                            debug!("📥️ Orders left for the next pass: {}", number_list(&result.failed));
                        }
                    },
                    Err(e) => error!("📥️ Error running the reconciliation pass. {e}"),
                }
            }
        }
    }
    info!("📥️ Reconciliation worker stopped");
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| match o.accrual {
            Some(accrual) => format!("[{}] order: {} user: #{} accrual: {accrual}", o.id, o.number, o.user_id),
            None => format!("[{}] order: {} user: #{}", o.id, o.number, o.user_id),
        })
        .collect::<Vec<String>>()
        .join(", ")
}

fn number_list(failures: &[(OrderNumber, String)]) -> String {
    failures.iter().map(|(n, _)| n.to_string()).collect::<Vec<String>>().join(", ")
}

#[cfg(test)]
mod test {
    use loyalty_engine::{
        accrual::{AccrualApiError, AccrualOrderStatus, AccrualStatus, Good},
        db_types::{OrderNumber, OrderStatusType, Points},
        test_utils::{MemoryDatabase, ScriptedAccrualService},
        BalanceApi,
        OrderManagement,
    };
    use mockall::mock;
    use tokio::time::{sleep, timeout};

    use super::*;

    const ORDER: &str = "79927398713";

    mock! {
        pub Accrual {}
        impl AccrualService for Accrual {
            async fn register_order(&self, number: &OrderNumber, goods: &[Good]) -> Result<(), AccrualApiError>;
            async fn fetch_order_status(&self, number: &OrderNumber) -> Result<Option<AccrualOrderStatus>, AccrualApiError>;
        }
    }

    async fn status_of(db: &MemoryDatabase, number: &str) -> OrderStatusType {
        db.fetch_order_by_number(&number.into()).await.unwrap().unwrap().status
    }

    #[tokio::test(start_paused = true)]
    async fn workers_drive_an_order_to_completion() {
        let db = MemoryDatabase::new();
        let balances = BalanceApi::new(db.clone());
        let user = balances.create_account("alice").await.unwrap();
        let orders = OrderFlowApi::new(db.clone());
        orders.upload_order(user.id, ORDER).await.unwrap();

        let accrual = ScriptedAccrualService::new();
        let shutdown = CancellationToken::new();
        let submission =
            run_submission_worker(OrderFlowApi::new(db.clone()), accrual.clone(), Duration::from_secs(3), shutdown.clone());
        let reconciliation = run_reconciliation_worker(
            OrderFlowApi::new(db.clone()),
            accrual.clone(),
            Duration::from_secs(5),
            shutdown.clone(),
        );
        let driver = async {
            // Nothing happens before the first tick
            sleep(Duration::from_secs(2)).await;
            assert_eq!(status_of(&db, ORDER).await, OrderStatusType::New);
            sleep(Duration::from_secs(2)).await;
            assert_eq!(status_of(&db, ORDER).await, OrderStatusType::Processing);
            assert_eq!(accrual.registered_orders(), vec![OrderNumber::from(ORDER)]);

            accrual.set_status(ORDER, AccrualStatus::Processed, Some(Points::from_points(500)));
            sleep(Duration::from_secs(6)).await;
            assert_eq!(status_of(&db, ORDER).await, OrderStatusType::Processed);
            assert_eq!(balances.balance(user.id).await.unwrap().current, Points::from_points(500));

            // More passes do not credit the order again
            sleep(Duration::from_secs(20)).await;
            assert_eq!(balances.balance(user.id).await.unwrap().current, Points::from_points(500));
            shutdown.cancel();
        };
        timeout(Duration::from_secs(60), async { tokio::join!(submission, reconciliation, driver) })
            .await
            .expect("Workers did not stop after cancellation");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_workers_stop_without_a_pass() {
        let db = MemoryDatabase::new();
        let accrual = || {
            let mut accrual = MockAccrual::new();
            accrual.expect_register_order().never();
            accrual.expect_fetch_order_status().never();
            accrual
        };
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let period = Duration::from_secs(1);
        let workers = async {
            tokio::join!(
                run_submission_worker(OrderFlowApi::new(db.clone()), accrual(), period, shutdown.clone()),
                run_reconciliation_worker(OrderFlowApi::new(db.clone()), accrual(), period, shutdown.clone()),
            )
        };
        timeout(Duration::from_millis(10), workers).await.expect("Workers did not stop promptly");
    }

    #[tokio::test(start_paused = true)]
    async fn accrual_outage_does_not_stop_the_workers() {
        let db = MemoryDatabase::new();
        let balances = BalanceApi::new(db.clone());
        let user = balances.create_account("alice").await.unwrap();
        OrderFlowApi::new(db.clone()).upload_order(user.id, ORDER).await.unwrap();

        let mut accrual = MockAccrual::new();
        accrual
            .expect_register_order()
            .times(3)
            .returning(|_, _| Err(AccrualApiError::Transport("connection refused".into())));
        let shutdown = CancellationToken::new();
        let worker = run_submission_worker(OrderFlowApi::new(db.clone()), accrual, Duration::from_secs(3), shutdown.clone());
        let driver = async {
            // Passes at 3s, 6s and 9s all fail
            sleep(Duration::from_secs(10)).await;
            assert_eq!(status_of(&db, ORDER).await, OrderStatusType::New);
            shutdown.cancel();
        };
        tokio::join!(worker, driver);
    }
}
