use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::db::models::Player;

/// Mirror a friendship both ways. Returns false if it already existed.
pub async fn add(db: &PgPool, login: &str, friend: &str) -> Result<bool> {
    let mut tx = db.begin().await.context("beginning friendship tx")?;
    let res = sqlx::query(
        "INSERT INTO friendships (player, friend)
         VALUES ($1, $2), ($2, $1)
         ON CONFLICT DO NOTHING",
    )
    .bind(login)
    .bind(friend)
    .execute(&mut *tx)
    .await
    .context("adding friendship")?;
    tx.commit().await.context("committing friendship")?;
    Ok(res.rows_affected() > 0)
}

pub async fn remove(db: &PgPool, login: &str, friend: &str) -> Result<bool> {
    let res = sqlx::query(
        "DELETE FROM friendships
          WHERE (player = $1 AND friend = $2) OR (player = $2 AND friend = $1)",
    )
    .bind(login)
    .bind(friend)
    .execute(db)
    .await
    .context("removing friendship")?;
    Ok(res.rows_affected() > 0)
}

pub async fn are_friends(db: &PgPool, login: &str, other: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM friendships WHERE player = $1 AND friend = $2)",
    )
    .bind(login)
    .bind(other)
    .fetch_one(db)
    .await
    .context("checking friendship")
}

pub async fn list(db: &PgPool, login: &str) -> Result<Vec<Player>> {
    sqlx::query_as::<_, Player>(
        "SELECT p.* FROM friendships f
           JOIN players p ON p.login = f.friend
          WHERE f.player = $1
          ORDER BY p.display_name",
    )
    .bind(login)
    .fetch_all(db)
    .await
    .context("listing friends")
}
