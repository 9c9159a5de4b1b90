use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::db::models::{Match, NewMatch, Side};

/// Persist a paired match with its precomputed rating deltas.
pub async fn insert<'e>(db: impl PgExecutor<'e>, new: &NewMatch) -> Result<Match> {
    let p1_wins = new.deltas.if_player1_wins;
    let p2_wins = new.deltas.if_player2_wins;

    sqlx::query_as::<_, Match>(
        r#"INSERT INTO matches (
               id, player1, player2, match_type,
               player1_rating_before, player2_rating_before,
               player1_win_delta, player1_loss_delta,
               player2_win_delta, player2_loss_delta)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
           RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.player1)
    .bind(&new.player2)
    .bind(new.match_type.as_str())
    .bind(new.player1_rating_before)
    .bind(new.player2_rating_before)
    .bind(p1_wins.winner_delta)
    .bind(p2_wins.loser_delta)
    .bind(p2_wins.winner_delta)
    .bind(p1_wins.loser_delta)
    .fetch_one(db)
    .await
    .context("inserting match")
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<Match>> {
    sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("fetching match")
}

/// Row-locking read used inside the completion transaction.
pub async fn get_for_update<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Match>> {
    sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("locking match")
}

/// The match a player is currently in, if any.
pub async fn active_for(db: &PgPool, login: &str) -> Result<Option<Match>> {
    sqlx::query_as::<_, Match>(
        "SELECT * FROM matches
          WHERE (player1 = $1 OR player2 = $1)
            AND status IN ('pending', 'in_progress')
          ORDER BY created_at DESC
          LIMIT 1",
    )
    .bind(login)
    .fetch_optional(db)
    .await
    .context("fetching active match")
}

/// Pending → in progress (idempotent).
pub async fn mark_started(db: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE matches SET status = 'in_progress' WHERE id = $1 AND status = 'pending'")
        .bind(id)
        .execute(db)
        .await
        .context("starting match")?;
    Ok(())
}

/// Add one point to `side`. `None` once the match is already finished.
pub async fn increment_score(db: &PgPool, id: Uuid, side: Side) -> Result<Option<Match>> {
    let sql = match side {
        Side::Player1 => {
            "UPDATE matches
                SET player1_score = player1_score + 1, status = 'in_progress'
              WHERE id = $1 AND status IN ('pending', 'in_progress')
          RETURNING *"
        }
        Side::Player2 => {
            "UPDATE matches
                SET player2_score = player2_score + 1, status = 'in_progress'
              WHERE id = $1 AND status IN ('pending', 'in_progress')
          RETURNING *"
        }
    };
    sqlx::query_as::<_, Match>(sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("incrementing score")
}

/// Finalise a match row. Rating changes are `None` for non-ranked matches.
pub async fn mark_completed<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    winner: &str,
    player1_change: Option<i32>,
    player2_change: Option<i32>,
) -> Result<Match> {
    sqlx::query_as::<_, Match>(
        "UPDATE matches
            SET status = 'completed',
                winner = $2,
                player1_rating_change = $3,
                player2_rating_change = $4,
                completed_at = now()
          WHERE id = $1
      RETURNING *",
    )
    .bind(id)
    .bind(winner)
    .bind(player1_change)
    .bind(player2_change)
    .fetch_one(db)
    .await
    .context("completing match")
}

/// One finished or live match seen from one player's side.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub opponent: String,
    pub match_type: String,
    pub status: String,
    pub player_score: i32,
    pub opponent_score: i32,
    pub winner: Option<String>,
    pub rating_change: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub async fn history(db: &PgPool, login: &str, limit: i64) -> Result<Vec<MatchSummary>> {
    sqlx::query_as::<_, MatchSummary>(
        r#"
        SELECT
            m.id AS match_id,
            CASE WHEN m.player1 = $1 THEN m.player2 ELSE m.player1 END               AS opponent,
            m.match_type,
            m.status,
            CASE WHEN m.player1 = $1 THEN m.player1_score ELSE m.player2_score END   AS player_score,
            CASE WHEN m.player1 = $1 THEN m.player2_score ELSE m.player1_score END   AS opponent_score,
            m.winner,
            CASE WHEN m.player1 = $1 THEN m.player1_rating_change
                 ELSE m.player2_rating_change END                                     AS rating_change,
            m.created_at,
            m.completed_at
        FROM matches m
        WHERE m.player1 = $1 OR m.player2 = $1
        ORDER BY m.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(login)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("fetching match history")
}
