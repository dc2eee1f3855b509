use sqlx::SqliteConnection;

use crate::db_types::{NewWithdrawal, Withdrawal};

/// Appends an entry to the withdrawal ledger. This does not touch the user's balance. See [`super::users::debit`].
pub(crate) async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"
        INSERT INTO withdrawals (user_id, order_number, sum)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(withdrawal.user_id)
    .bind(withdrawal.order_number)
    .bind(withdrawal.sum)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

/// Fetches the ledger for `user_id`, most recent first.
pub async fn withdrawals_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
