use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::db::models::Player;
use crate::rating::elo;

/// Insert a player on first login, refresh the profile afterwards.
/// Rating and games played are never touched here.
pub async fn upsert_profile(
    db: &PgPool,
    login: &str,
    display_name: &str,
    avatar_url: Option<&str>,
) -> Result<Player> {
    sqlx::query_as::<_, Player>(
        r#"INSERT INTO players (login, display_name, avatar_url)
           VALUES ($1, $2, $3)
           ON CONFLICT (login) DO UPDATE
              SET display_name = EXCLUDED.display_name,
                  avatar_url   = EXCLUDED.avatar_url
           RETURNING *"#,
    )
    .bind(login)
    .bind(display_name)
    .bind(avatar_url)
    .fetch_one(db)
    .await
    .context("upserting player profile")
}

pub async fn get(db: &PgPool, login: &str) -> Result<Option<Player>> {
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE login = $1")
        .bind(login)
        .fetch_optional(db)
        .await
        .context("fetching player")
}

/// Fetch several players at once; missing logins are simply absent.
pub async fn get_many(db: &PgPool, logins: &[String]) -> Result<Vec<Player>> {
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE login = ANY($1)")
        .bind(logins)
        .fetch_all(db)
        .await
        .context("fetching players")
}

/// Apply a ranked rating delta to the locked player row and count the game.
/// The floor is enforced by `elo::apply_delta`. Returns `(rating_before, rating_after)`.
pub async fn apply_rating_change(
    conn: &mut PgConnection,
    login: &str,
    delta: i32,
) -> Result<(i32, i32)> {
    let before: i32 = sqlx::query_scalar("SELECT rating FROM players WHERE login = $1 FOR UPDATE")
        .bind(login)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("locking rating of {login}"))?;
    let after = elo::apply_delta(before, delta);

    sqlx::query(
        "UPDATE players
            SET rating       = $2,
                games_played = games_played + 1
          WHERE login = $1",
    )
    .bind(login)
    .bind(after)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("applying rating delta to {login}"))?;

    Ok((before, after))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LeaderboardRow {
    pub rank: i64,
    pub login: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub rating: i32,
    pub games_played: i32,
    pub wins: i64,
    pub losses: i64,
}

/// One page of players ordered by rating.
pub async fn leaderboard(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<LeaderboardRow>> {
    sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT ranked.* FROM (
            SELECT ROW_NUMBER() OVER (ORDER BY p.rating DESC, p.games_played DESC, p.login) AS rank,
                   p.login, p.display_name, p.avatar_url, p.rating, p.games_played,
                   (SELECT COUNT(*) FROM matches m
                     WHERE m.status = 'completed' AND m.winner = p.login)           AS wins,
                   (SELECT COUNT(*) FROM matches m
                     WHERE m.status = 'completed'
                       AND (m.player1 = p.login OR m.player2 = p.login)
                       AND m.winner IS NOT NULL AND m.winner <> p.login)             AS losses
              FROM players p
        ) ranked
        ORDER BY ranked.rank
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("querying leaderboard")
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PlayerStats {
    pub wins: i64,
    pub losses: i64,
    pub rank: Option<i64>,
}

pub async fn stats(db: &PgPool, login: &str) -> Result<PlayerStats> {
    sqlx::query_as::<_, PlayerStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM matches m
              WHERE m.status = 'completed' AND m.winner = $1)                      AS wins,
            (SELECT COUNT(*) FROM matches m
              WHERE m.status = 'completed'
                AND (m.player1 = $1 OR m.player2 = $1)
                AND m.winner IS NOT NULL AND m.winner <> $1)                         AS losses,
            (SELECT r.rank FROM (
                SELECT login,
                       ROW_NUMBER() OVER (ORDER BY rating DESC, games_played DESC, login) AS rank
                  FROM players) r
              WHERE r.login = $1)                                                    AS rank
        "#,
    )
    .bind(login)
    .fetch_one(db)
    .await
    .context("computing player stats")
}
