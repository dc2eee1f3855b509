use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType, Points},
    traits::OrderManagementError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// The uniqueness constraint on `number` is the final arbiter for duplicate uploads: a violation is reported as
/// `OrderAlreadyExists`, whether the existing order was stored long ago or a microsecond ago by a concurrent caller.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderManagementError> {
    let number = order.number.clone();
    let result: Result<Order, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO orders (number, user_id, status)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order.number)
    .bind(order.user_id)
    .bind(OrderStatusType::New)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => {
            debug!("📝️ Order [{}] inserted with id {}", order.number, order.id);
            Ok(order)
        },
        Err(e) if is_unique_violation(&e) => {
            debug!("📝️ Order [{number}] already exists. Insert skipped");
            Err(OrderManagementError::OrderAlreadyExists(number))
        },
        Err(e) => Err(e.into()),
    }
}

/// Returns the order with the corresponding `number`
pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches all the orders uploaded by `user_id`, ordered by upload time in ascending order
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_orders_by_status(
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE status = $1").bind(status).fetch_all(conn).await?;
    trace!("📝️ Fetched {} orders with status {status}", orders.len());
    Ok(orders)
}

/// Moves the order into `status` and sets its accrual, but only if the order's current status is allowed to make the
/// transition. The check and the write are a single statement, so two callers racing to move the same order can never
/// both succeed.
///
/// The accrual is written as given. Callers are responsible for checking that it agrees with the new status (the
/// table constraint will reject the write otherwise).
pub(crate) async fn update_order_status(
    number: &OrderNumber,
    status: OrderStatusType,
    accrual: Option<Points>,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderManagementError> {
    let predecessors = OrderStatusType::predecessors(status);
    if !predecessors.is_empty() {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, status = ");
        builder.push_bind(status);
        builder.push(", accrual = ");
        builder.push_bind(accrual);
        builder.push(" WHERE number = ");
        builder.push_bind(number.as_str());
        builder.push(" AND status IN (");
        let mut statuses = builder.separated(", ");
        for s in predecessors {
            statuses.push_bind(s);
        }
        builder.push(") RETURNING *");
        trace!("📝️ Executing query: {}", builder.sql());
        let updated: Option<Order> = builder.build_query_as().fetch_optional(&mut *conn).await?;
        if let Some(order) = updated {
            debug!("📝️ Order [{number}] is now {status}");
            return Ok(order);
        }
    }
    // Nothing was updated. Work out why.
    match fetch_order_by_number(number, conn).await? {
        None => Err(OrderManagementError::OrderNotFound(number.clone())),
        Some(existing) => Err(OrderManagementError::IllegalStatusTransition {
            number: number.clone(),
            from: existing.status,
            to: status,
        }),
    }
}
