use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::db::models::{Notification, NotificationKind};

pub async fn create<'e>(
    db: impl PgExecutor<'e>,
    recipient: &str,
    kind: NotificationKind,
    payload: serde_json::Value,
) -> Result<Notification> {
    sqlx::query_as::<_, Notification>(
        r#"INSERT INTO notifications (id, recipient, kind, payload)
           VALUES ($1, $2, $3, $4)
           RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(recipient)
    .bind(kind.as_str())
    .bind(payload)
    .fetch_one(db)
    .await
    .context("creating notification")
}

pub async fn list(db: &PgPool, login: &str, unread_only: bool, limit: i64) -> Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications
          WHERE recipient = $1 AND (NOT $2 OR read = FALSE)
          ORDER BY created_at DESC
          LIMIT $3",
    )
    .bind(login)
    .bind(unread_only)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("listing notifications")
}

/// Returns whether the notification existed and belonged to `login`.
pub async fn mark_read(db: &PgPool, login: &str, id: Uuid) -> Result<bool> {
    let res = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient = $2")
        .bind(id)
        .bind(login)
        .execute(db)
        .await
        .context("marking notification read")?;
    Ok(res.rows_affected() > 0)
}

pub async fn mark_all_read(db: &PgPool, login: &str) -> Result<u64> {
    let res = sqlx::query("UPDATE notifications SET read = TRUE WHERE recipient = $1 AND read = FALSE")
        .bind(login)
        .execute(db)
        .await
        .context("marking notifications read")?;
    Ok(res.rows_affected())
}
