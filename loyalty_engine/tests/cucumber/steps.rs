use cucumber::{then, when};
use loyalty_engine::{
    accrual::{AccrualApiError, AccrualStatus},
    balance_objects::WithdrawalRequest,
    db_types::{OrderStatusType, Points},
    order_objects::UploadOutcome,
    BalanceApiError,
    OrderFlowError,
    OrderManagement,
};
use tokio_util::sync::CancellationToken;

use crate::cucumber::LoyaltyWorld;

fn points(amount: f64) -> Points {
    Points::try_from(amount).expect("Invalid amount")
}

#[when(expr = "{word} uploads order {string}")]
async fn upload_order(world: &mut LoyaltyWorld, login: String, number: String) {
    let sys = world.system_mut();
    let result = sys.orders.upload_order(sys.user_id(&login), &number).await;
    sys.last_upload = Some(result);
}

//             Then the upload result is owned-by-other
#[then(expr = "the upload result is {word}")]
async fn upload_result(world: &mut LoyaltyWorld, expected: String) {
    let result = world.system_mut().last_upload.take().expect("No upload was made");
    let actual = match &result {
        Ok(UploadOutcome::Created(_)) => "created",
        Ok(UploadOutcome::AlreadyExists(_)) => "already-exists",
        Err(OrderFlowError::OwnedByAnotherUser(_)) => "owned-by-other",
        Err(OrderFlowError::InvalidOrderNumber(_)) => "invalid-number",
        Err(_) => "internal-error",
    };
    assert_eq!(actual, expected, "Unexpected upload result: {result:?}");
}

#[when(expr = "the accrual service is unreachable for order {word}")]
async fn registration_fails(world: &mut LoyaltyWorld, number: String) {
    let accrual = &world.system().accrual;
    accrual.reject_registration(number.as_str());
    accrual.fail_status(number.as_str(), AccrualApiError::Transport("connection refused".into()));
}

#[when(expr = "the accrual service recovers for order {word}")]
async fn registration_recovers(world: &mut LoyaltyWorld, number: String) {
    let accrual = &world.system().accrual;
    accrual.accept_registration(number.as_str());
    accrual.clear_status(number.as_str());
}

#[when(expr = "the accrual service reports order {word} as {word}")]
async fn accrual_reports(world: &mut LoyaltyWorld, number: String, status: String) {
    let status = AccrualStatus::from(status.as_str());
    world.system().accrual.set_status(number.as_str(), status, None);
}

#[when(expr = "the accrual service reports order {word} as PROCESSED with {float} points")]
async fn accrual_reports_processed(world: &mut LoyaltyWorld, number: String, amount: f64) {
    world.system().accrual.set_status(number.as_str(), AccrualStatus::Processed, Some(points(amount)));
}

#[when("the submission worker runs")]
async fn submission_pass(world: &mut LoyaltyWorld) {
    let sys = world.system();
    sys.orders.submit_new_orders(&sys.accrual, &CancellationToken::new()).await.expect("Submission pass failed");
}

#[when("the reconciliation worker runs")]
async fn reconciliation_pass(world: &mut LoyaltyWorld) {
    let sys = world.system();
    sys.orders
        .reconcile_processing_orders(&sys.accrual, &CancellationToken::new())
        .await
        .expect("Reconciliation pass failed");
}

#[then(expr = "order {word} has status {word}")]
async fn order_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid status");
    let order = world.system().db.fetch_order_by_number(&number.as_str().into()).await.unwrap();
    let order = order.unwrap_or_else(|| panic!("Order {number} does not exist"));
    assert_eq!(order.status, expected);
    assert!(order.check_accrual_invariant().is_ok());
}

#[then(expr = "order {word} has an accrual of {float} points")]
async fn order_accrual(world: &mut LoyaltyWorld, number: String, amount: f64) {
    let order = world.system().db.fetch_order_by_number(&number.as_str().into()).await.unwrap().unwrap();
    assert_eq!(order.accrual, Some(points(amount)));
}

#[then(expr = "{word} has {int} order(s)")]
async fn order_count(world: &mut LoyaltyWorld, login: String, count: usize) {
    let sys = world.system();
    let orders = sys.orders.orders_for_user(sys.user_id(&login)).await.unwrap();
    assert_eq!(orders.len(), count);
}

#[then(expr = "{word} has a balance of {float} points and has withdrawn {float} points")]
async fn balance(world: &mut LoyaltyWorld, login: String, current: f64, withdrawn: f64) {
    let sys = world.system();
    let balance = sys.balances.balance(sys.user_id(&login)).await.unwrap();
    assert_eq!(balance.current, points(current));
    assert_eq!(balance.withdrawn, points(withdrawn));
}

#[when(expr = "{word} withdraws {float} points against order {word}")]
async fn withdraw(world: &mut LoyaltyWorld, login: String, amount: f64, number: String) {
    let sys = world.system_mut();
    let request = WithdrawalRequest::new(number, points(amount));
    let result = sys.balances.withdraw(sys.user_id(&login), request).await;
    sys.last_withdrawal = Some(result);
}

#[then(expr = "the withdrawal result is {word}")]
async fn withdrawal_result(world: &mut LoyaltyWorld, expected: String) {
    let result = world.system_mut().last_withdrawal.take().expect("No withdrawal was made");
    let actual = match &result {
        Ok(_) => "ok",
        Err(BalanceApiError::InvalidOrderNumber(_)) => "invalid-order",
        Err(BalanceApiError::InsufficientFunds { .. }) => "insufficient-funds",
        Err(_) => "internal-error",
    };
    assert_eq!(actual, expected, "Unexpected withdrawal result: {result:?}");
}

#[then(expr = "{word} has {int} withdrawal(s)")]
async fn withdrawal_count(world: &mut LoyaltyWorld, login: String, count: usize) {
    let sys = world.system();
    let entries = sys.balances.withdrawals(sys.user_id(&login)).await.unwrap();
    assert_eq!(entries.len(), count);
}
