use log::{debug, trace};
use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{Points, UserAccount},
    traits::BalanceManagementError,
};

pub async fn insert_user(login: &str, conn: &mut SqliteConnection) -> Result<UserAccount, BalanceManagementError> {
    let result: Result<UserAccount, sqlx::Error> =
        sqlx::query_as("INSERT INTO users (login) VALUES ($1) RETURNING *").bind(login).fetch_one(conn).await;
    match result {
        Ok(account) => {
            debug!("🧑️ User account #{} created for '{login}'", account.id);
            Ok(account)
        },
        Err(e) if is_unique_violation(&e) => Err(BalanceManagementError::LoginTaken(login.to_string())),
        Err(e) => Err(e.into()),
    }
}

pub async fn user_account_by_id(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(account)
}

/// Increases the current balance of the account in a single statement. Not atomic with respect to any other statement;
/// embed it in a transaction if it needs to be.
pub(crate) async fn credit(
    user_id: i64,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, BalanceManagementError> {
    let account: Option<UserAccount> =
        sqlx::query_as("UPDATE users SET current_balance = current_balance + $1 WHERE id = $2 RETURNING *")
            .bind(amount)
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
    let account = account.ok_or(BalanceManagementError::UserNotFound(user_id))?;
    trace!("🧑️ Account #{user_id} credited with {amount}. Balance is now {}", account.current_balance);
    Ok(account)
}

/// Moves `amount` from the current balance to the withdrawn total, if and only if the current balance covers it.
///
/// The balance check is part of the `UPDATE` statement itself, so concurrent debits cannot both pass the check against
/// the same stale balance.
pub(crate) async fn debit(
    user_id: i64,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, BalanceManagementError> {
    let account: Option<UserAccount> = sqlx::query_as(
        r#"
        UPDATE users
        SET current_balance = current_balance - $1,
            total_withdrawn = total_withdrawn + $1
        WHERE id = $2 AND current_balance >= $1
        RETURNING *
        "#,
    )
    .bind(amount)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    match account {
        Some(account) => {
            trace!("🧑️ Account #{user_id} debited with {amount}. Balance is now {}", account.current_balance);
            Ok(account)
        },
        None => {
            let existing =
                user_account_by_id(user_id, conn).await?.ok_or(BalanceManagementError::UserNotFound(user_id))?;
            Err(BalanceManagementError::InsufficientFunds { requested: amount, available: existing.current_balance })
        },
    }
}
