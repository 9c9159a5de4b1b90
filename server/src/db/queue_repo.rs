use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::db::models::{MatchType, QueueEntry};

/// Add a waiting entry. `None` if the player is already waiting.
pub async fn enqueue(db: &PgPool, login: &str, mode: MatchType) -> Result<Option<QueueEntry>> {
    sqlx::query_as::<_, QueueEntry>(
        r#"INSERT INTO matchmaking_queue (id, player, match_type)
           VALUES ($1, $2, $3)
           ON CONFLICT (player) WHERE status = 'waiting' DO NOTHING
           RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(login)
    .bind(mode.as_str())
    .fetch_optional(db)
    .await
    .context("enqueueing player")
}

/// Cancel the player's waiting entry. Returns whether one existed.
pub async fn cancel<'e>(db: impl PgExecutor<'e>, login: &str) -> Result<bool> {
    let res = sqlx::query(
        "UPDATE matchmaking_queue SET status = 'cancelled'
          WHERE player = $1 AND status = 'waiting'",
    )
    .bind(login)
    .execute(db)
    .await
    .context("leaving queue")?;
    Ok(res.rows_affected() > 0)
}

/// Every waiting entry in arrival order.
pub async fn waiting(db: &PgPool) -> Result<Vec<QueueEntry>> {
    sqlx::query_as::<_, QueueEntry>(
        "SELECT * FROM matchmaking_queue
          WHERE status = 'waiting'
          ORDER BY joined_at, id",
    )
    .fetch_all(db)
    .await
    .context("listing waiting players")
}

pub async fn waiting_entry(db: &PgPool, login: &str) -> Result<Option<QueueEntry>> {
    sqlx::query_as::<_, QueueEntry>(
        "SELECT * FROM matchmaking_queue WHERE player = $1 AND status = 'waiting'",
    )
    .bind(login)
    .fetch_optional(db)
    .await
    .context("fetching queue entry")
}

/// 1-based position among waiting entries of the same mode.
pub async fn position(db: &PgPool, entry: &QueueEntry) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM matchmaking_queue
          WHERE status = 'waiting'
            AND match_type = $1
            AND (joined_at, id) <= ($2, $3)",
    )
    .bind(entry.match_type.as_str())
    .bind(entry.joined_at)
    .bind(entry.id)
    .fetch_one(db)
    .await
    .context("computing queue position")
}

/// Flip still-waiting entries to matched. Returns how many rows changed so
/// the caller can detect a player who left in the meantime.
pub async fn mark_matched<'e>(db: impl PgExecutor<'e>, ids: &[Uuid], match_id: Uuid) -> Result<u64> {
    let res = sqlx::query(
        "UPDATE matchmaking_queue
            SET status = 'matched', match_id = $2
          WHERE id = ANY($1) AND status = 'waiting'",
    )
    .bind(ids)
    .bind(match_id)
    .execute(db)
    .await
    .context("marking queue entries matched")?;
    Ok(res.rows_affected())
}
